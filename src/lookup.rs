//! Contact lookup: run the store query and shape the result.
//!
//! Used by both the `contact-lookup lookup` CLI command and the
//! `GET /contacts` HTTP endpoint.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::error::LookupError;
use crate::format::format_contacts;
use crate::models::ContactList;
use crate::query::LookupQuery;
use crate::store::ContactStore;

/// Core lookup returning structured data (used by CLI and server).
///
/// Zero matching rows is reported as `NotFound`. Store failures are logged
/// with their cause and reported as `Internal`.
pub async fn lookup_contacts(
    store: &dyn ContactStore,
    query: &LookupQuery,
) -> Result<ContactList, LookupError> {
    tracing::debug!(
        backend = store.backend(),
        phone_pattern = query.phone_pattern().as_deref(),
        email = query.email(),
        "Executing contact lookup"
    );

    let records = store.find_contacts(query).await.map_err(|e| {
        tracing::error!(error = %e, backend = store.backend(), "Database error");
        LookupError::Internal(e.to_string())
    })?;

    tracing::debug!(rows = records.len(), "Database returned results");

    if records.is_empty() {
        tracing::debug!("No contacts found for the given query parameters");
        return Err(LookupError::NotFound);
    }

    Ok(format_contacts(records))
}

/// CLI entry point: runs one lookup and prints the response body.
pub async fn run_lookup(config: &Config, number: Option<&str>, email: Option<&str>) -> Result<()> {
    let query = LookupQuery::new(number, email)?;
    let store = db::connect(config).await?;

    match lookup_contacts(store.as_ref(), &query).await {
        Ok(list) => {
            println!("{}", serde_json::to_string_pretty(&list)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
