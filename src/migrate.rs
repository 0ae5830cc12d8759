//! Development schema for a SQLite contact store.
//!
//! In production the contacts table belongs to the phone system's MySQL
//! database and is never created or altered here. `init` only prepares a
//! local SQLite file with the same columns, for development and testing.

use anyhow::{bail, Result};
use sqlx::SqlitePool;

use crate::config::{Backend, Config};
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    if config.database.backend() != Some(Backend::Sqlite) {
        bail!("init only manages SQLite stores; the MySQL contacts table is owned by the phone system");
    }

    let pool = db::connect_sqlite(config, true).await?;
    create_contacts_table(&pool, &config.database.table).await?;
    pool.close().await;
    Ok(())
}

/// Creates the contacts table and its email index if they do not exist.
pub async fn create_contacts_table(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{table}" (
            id INTEGER PRIMARY KEY,
            RealName TEXT,
            WorkPhone TEXT,
            MobilePhone TEXT,
            HomePhone TEXT,
            EmailAddress TEXT,
            Organization TEXT
        )
        "#,
        table = table
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS \"idx_{table}_email\" ON \"{table}\"(EmailAddress)",
        table = table
    ))
    .execute(pool)
    .await?;

    Ok(())
}
