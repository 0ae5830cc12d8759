//! Contact store access.
//!
//! [`ContactStore`] runs the single lookup query. Two implementations share
//! the same SQL shape:
//!
//! - [`SqliteContactStore`] for local development and tests
//! - [`MySqlContactStore`] for the phone-system database
//!
//! Caller input is always bound as a parameter. The only interpolated
//! element is the table name, which `config` restricts to a plain
//! identifier.
//!
//! A phone search matches a row when any of the work, mobile or home
//! columns, with spaces removed, contains the search digits. An email
//! search matches the email column exactly. When both are given, a row
//! matching either is returned.

use async_trait::async_trait;
use sqlx::mysql::MySqlPool;
use sqlx::{Row, SqlitePool};

use crate::models::ContactRecord;
use crate::query::{LookupQuery, LIKE_ESCAPE};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("contact query failed: {0}")]
    Query(#[from] sqlx::Error),
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Short backend name for logs (`"sqlite"`, `"mysql"`).
    fn backend(&self) -> &'static str;

    /// Returns every matching row in the store's natural order.
    async fn find_contacts(&self, query: &LookupQuery) -> Result<Vec<ContactRecord>, StoreError>;
}

/// Builds the lookup SQL. Bind order: phone pattern three times, then email.
fn lookup_sql(table: &str, id_expr: &str) -> String {
    format!(
        r#"
        SELECT
            {id_expr} AS contactid,
            RealName,
            WorkPhone,
            MobilePhone,
            HomePhone,
            EmailAddress,
            Organization
        FROM {table}
        WHERE
            REPLACE(WorkPhone, ' ', '') LIKE ? ESCAPE '{esc}'
            OR REPLACE(MobilePhone, ' ', '') LIKE ? ESCAPE '{esc}'
            OR REPLACE(HomePhone, ' ', '') LIKE ? ESCAPE '{esc}'
            OR EmailAddress = ?
        "#,
        id_expr = id_expr,
        table = table,
        esc = LIKE_ESCAPE,
    )
}

fn record_from_row<'r, R>(row: &'r R) -> Result<ContactRecord, sqlx::Error>
where
    R: Row,
    &'static str: sqlx::ColumnIndex<R>,
    i64: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    Option<String>: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
{
    Ok(ContactRecord {
        id: row.try_get("contactid")?,
        real_name: row.try_get("RealName")?,
        work_phone: row.try_get("WorkPhone")?,
        mobile_phone: row.try_get("MobilePhone")?,
        home_phone: row.try_get("HomePhone")?,
        email_address: row.try_get("EmailAddress")?,
        organization: row.try_get("Organization")?,
    })
}

pub struct SqliteContactStore {
    pool: SqlitePool,
    sql: String,
}

impl SqliteContactStore {
    pub fn new(pool: SqlitePool, table: &str) -> Self {
        Self {
            pool,
            sql: lookup_sql(&format!("\"{}\"", table), "id"),
        }
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn find_contacts(&self, query: &LookupQuery) -> Result<Vec<ContactRecord>, StoreError> {
        let pattern = query.phone_pattern();
        let rows = sqlx::query(&self.sql)
            .bind(pattern.clone())
            .bind(pattern.clone())
            .bind(pattern)
            .bind(query.email())
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

pub struct MySqlContactStore {
    pool: MySqlPool,
    sql: String,
}

impl MySqlContactStore {
    pub fn new(pool: MySqlPool, table: &str) -> Self {
        Self {
            pool,
            // Normalise INT/INT UNSIGNED/BIGINT ids to a signed 64-bit value.
            sql: lookup_sql(&format!("`{}`", table), "CAST(id AS SIGNED)"),
        }
    }
}

#[async_trait]
impl ContactStore for MySqlContactStore {
    fn backend(&self) -> &'static str {
        "mysql"
    }

    async fn find_contacts(&self, query: &LookupQuery) -> Result<Vec<ContactRecord>, StoreError> {
        let pattern = query.phone_pattern();
        let rows = sqlx::query(&self.sql)
            .bind(pattern.clone())
            .bind(pattern.clone())
            .bind(pattern)
            .bind(query.email())
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn seeded_store() -> SqliteContactStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate::create_contacts_table(&pool, "Users").await.unwrap();

        for (id, name, work, mobile, home, email, org) in [
            (1, Some("Jane Public"), Some("555 1234567"), None, None, None, None),
            (2, Some("John Doe"), None, Some("+44 20 7946 0000"), None, Some("john@doe.com"), Some("Doe Ltd")),
            (3, Some("Ann Other"), None, None, Some("0800 50%"), Some("ann@other.org"), None),
        ] {
            sqlx::query(
                "INSERT INTO Users (id, RealName, WorkPhone, MobilePhone, HomePhone, EmailAddress, Organization) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(id as i64)
            .bind(name)
            .bind(work)
            .bind(mobile)
            .bind(home)
            .bind(email)
            .bind(org)
            .execute(&pool)
            .await
            .unwrap();
        }

        SqliteContactStore::new(pool, "Users")
    }

    async fn ids(store: &SqliteContactStore, number: Option<&str>, email: Option<&str>) -> Vec<i64> {
        let query = LookupQuery::new(number, email).unwrap();
        store
            .find_contacts(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect()
    }

    #[tokio::test]
    async fn test_phone_match_ignores_spacing() {
        let store = seeded_store().await;
        assert_eq!(ids(&store, Some("5551234567"), None).await, vec![1]);
        assert_eq!(ids(&store, Some("555 1234567"), None).await, vec![1]);
        assert_eq!(ids(&store, Some("555 123 4567"), None).await, vec![1]);
    }

    #[tokio::test]
    async fn test_phone_substring_matches_any_column() {
        let store = seeded_store().await;
        assert_eq!(ids(&store, Some("7946"), None).await, vec![2]);
        assert_eq!(ids(&store, Some("123"), None).await, vec![1]);
    }

    #[tokio::test]
    async fn test_email_exact_only() {
        let store = seeded_store().await;
        assert_eq!(ids(&store, None, Some("john@doe.com")).await, vec![2]);
        assert!(ids(&store, None, Some("john@doe.co")).await.is_empty());
        assert!(ids(&store, None, Some("doe.com")).await.is_empty());
    }

    #[tokio::test]
    async fn test_both_inputs_or_combined() {
        let store = seeded_store().await;
        let mut found = ids(&store, Some("5551234567"), Some("ann@other.org")).await;
        found.sort();
        assert_eq!(found, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_wildcard_input_is_literal() {
        let store = seeded_store().await;
        assert_eq!(ids(&store, Some("%"), None).await, vec![3]);
        assert_eq!(ids(&store, Some("50%"), None).await, vec![3]);
        assert!(ids(&store, Some("_"), None).await.is_empty());
    }

    #[tokio::test]
    async fn test_row_fields_are_read() {
        let store = seeded_store().await;
        let query = LookupQuery::new(None, Some("john@doe.com")).unwrap();
        let records = store.find_contacts(&query).await.unwrap();
        assert_eq!(
            records,
            vec![ContactRecord {
                id: 2,
                real_name: Some("John Doe".to_string()),
                work_phone: None,
                mobile_phone: Some("+44 20 7946 0000".to_string()),
                home_phone: None,
                email_address: Some("john@doe.com".to_string()),
                organization: Some("Doe Ltd".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_table_is_an_error() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteContactStore::new(pool, "Users");
        let query = LookupQuery::new(Some("1"), None).unwrap();
        assert!(matches!(
            store.find_contacts(&query).await,
            Err(StoreError::Query(_))
        ));
    }

    #[test]
    fn test_sql_binds_every_input() {
        let sql = lookup_sql("\"Users\"", "id");
        assert_eq!(sql.matches('?').count(), 4);
        assert!(sql.contains("FROM \"Users\""));
        assert!(sql.contains("ESCAPE '!'"));
    }
}
