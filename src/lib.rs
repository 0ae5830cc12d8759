//! # Contact Lookup
//!
//! A contact-lookup gateway for phone-system directory clients.
//!
//! The service answers `GET /contacts?Number=..&Email=..` with matching
//! rows from a contacts table, reshaped into the field schema the phone
//! system's directory client expects. Every request is rate limited per
//! client address and authenticated with HTTP Basic credentials.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌──────┐   ┌───────────┐   ┌──────────────┐   ┌───────────┐
//! │  Rate   │──▶│ Auth │──▶│ Validator │──▶│    Store     │──▶│ Formatter │
//! │ limiter │   │ gate │   │  (query)  │   │ SQLite/MySQL │   │           │
//! └─────────┘   └──────┘   └───────────┘   └──────────────┘   └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! contact-lookup init                          # create a local SQLite store
//! contact-lookup lookup --number "555 123"     # one-off lookup, prints JSON
//! contact-lookup serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`error`] | Failure taxonomy and HTTP mapping |
//! | [`auth`] | Basic credential parsing and constant-time verification |
//! | [`rate_limit`] | Per-address fixed-window quotas |
//! | [`query`] | Search input validation |
//! | [`models`] | Core data types |
//! | [`format`] | Row-to-response reshaping |
//! | [`store`] | Contact store trait and SQL backends |
//! | [`db`] | Database connection |
//! | [`migrate`] | Development schema |
//! | [`lookup`] | Lookup orchestration |
//! | [`server`] | HTTP server |

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod lookup;
pub mod migrate;
pub mod models;
pub mod query;
pub mod rate_limit;
pub mod server;
pub mod store;
