use anyhow::{bail, Context, Result};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Backend, Config};
use crate::store::{ContactStore, MySqlContactStore, SqliteContactStore};

/// Opens the configured store.
pub async fn connect(config: &Config) -> Result<Arc<dyn ContactStore>> {
    let table = &config.database.table;
    let store: Arc<dyn ContactStore> = match config.database.backend() {
        Some(Backend::Sqlite) => Arc::new(SqliteContactStore::new(
            connect_sqlite(config, false).await?,
            table,
        )),
        Some(Backend::MySql) => Arc::new(MySqlContactStore::new(connect_mysql(config).await?, table)),
        None => bail!("Unsupported database.url scheme"),
    };
    Ok(store)
}

/// SQLite pool. `create` makes the file (and its directory) when missing;
/// lookups open an existing file only.
pub async fn connect_sqlite(config: &Config, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database.url)
        .with_context(|| "Invalid SQLite database.url")?
        .create_if_missing(create);

    if create {
        // Ensure parent directory exists
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(acquire_timeout(config))
        .connect_with(options)
        .await
        .with_context(|| "Failed to open SQLite contact store")?;

    Ok(pool)
}

pub async fn connect_mysql(config: &Config) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(acquire_timeout(config))
        .test_before_acquire(true)
        .connect(&config.database.url)
        .await
        .with_context(|| "Failed to connect to MySQL contact store")?;

    Ok(pool)
}

fn acquire_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.server.request_timeout_secs)
}
