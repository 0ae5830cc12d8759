//! Core data types.
//!
//! [`ContactRecord`] is a row as the store holds it; [`ContactResponse`] is
//! the shape the phone-system directory client consumes.

use serde::Serialize;

/// A contact row from the store. Any column but `id` may be `NULL`, and
/// phone columns may contain formatting spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactRecord {
    pub id: i64,
    pub real_name: Option<String>,
    pub work_phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub home_phone: Option<String>,
    pub email_address: Option<String>,
    pub organization: Option<String>,
}

/// One entry of the lookup response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactResponse {
    pub contactid: i64,
    pub firstname: String,
    pub lastname: String,
    pub company: String,
    /// Serialized as `null` when the store has no address.
    pub email: Option<String>,
    pub phonebusiness: String,
    pub phonemobile: String,
    pub phonehome: String,
}

/// Response body for a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactList {
    pub contacts: Vec<ContactResponse>,
}
