//! Reshapes store rows into the directory client's field schema.

use crate::models::{ContactList, ContactRecord, ContactResponse};

/// Splits a display name at its first space.
///
/// `"Jane Q Public"` gives `("Jane", "Q Public")`; a single token gives an
/// empty last name; a missing name gives two empty strings. Spacing after
/// the first space is kept as stored.
pub fn split_name(name: Option<&str>) -> (String, String) {
    match name.unwrap_or("").split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.to_string()),
        None => (name.unwrap_or("").to_string(), String::new()),
    }
}

pub fn format_contact(record: ContactRecord) -> ContactResponse {
    let (firstname, lastname) = split_name(record.real_name.as_deref());
    ContactResponse {
        contactid: record.id,
        firstname,
        lastname,
        company: record.organization.unwrap_or_default(),
        email: record.email_address,
        phonebusiness: record.work_phone.unwrap_or_default(),
        phonemobile: record.mobile_phone.unwrap_or_default(),
        phonehome: record.home_phone.unwrap_or_default(),
    }
}

/// Formats rows in store order.
pub fn format_contacts(records: Vec<ContactRecord>) -> ContactList {
    let contacts = records
        .into_iter()
        .map(|record| {
            let contact = format_contact(record);
            tracing::debug!(?contact, "Appending contact");
            contact
        })
        .collect();
    ContactList { contacts }
}
