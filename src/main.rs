//! # Contact Lookup CLI (`contact-lookup`)
//!
//! ## Usage
//!
//! ```bash
//! contact-lookup --config ./config/lookup.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `contact-lookup serve` | Start the HTTP lookup server |
//! | `contact-lookup lookup --number <N> --email <E>` | Run one lookup and print the JSON body |
//! | `contact-lookup init` | Create the contacts table in a SQLite store |
//! | `contact-lookup check-config` | Print the effective configuration, secrets masked |
//!
//! Settings come from the TOML file, then from the environment (a `.env`
//! file in the working directory is loaded first). See `config` for the
//! recognised variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use contact_lookup::{config, lookup, migrate, server};

/// Contact lookup gateway for phone-system directory clients.
#[derive(Parser)]
#[command(
    name = "contact-lookup",
    about = "Contact lookup gateway for phone-system directory clients",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Optional: when the file does not exist, defaults and environment
    /// variables are used.
    #[arg(long, global = true, default_value = "./config/lookup.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP lookup server.
    Serve,

    /// Run a single lookup against the store and print the response body.
    Lookup {
        /// Phone number or fragment; spaces are ignored.
        #[arg(long)]
        number: Option<String>,

        /// Exact email address.
        #[arg(long)]
        email: Option<String>,
    },

    /// Create the contacts table in a SQLite store.
    ///
    /// Idempotent. Refuses to touch MySQL stores.
    Init,

    /// Print the effective configuration with secrets masked.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    init_tracing(&cfg.logging.level);

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Lookup { number, email } => {
            lookup::run_lookup(&cfg, number.as_deref(), email.as_deref()).await?;
        }
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Contacts table '{}' ready.", cfg.database.table);
        }
        Commands::CheckConfig => {
            print!("{}", toml::to_string_pretty(&cfg.redacted())?);
        }
    }

    Ok(())
}

/// `RUST_LOG` takes precedence over `logging.level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("contact_lookup={level},tower_http={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
