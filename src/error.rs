//! Request failure taxonomy and its HTTP mapping.
//!
//! Every failure is answered with a status code and a short JSON body:
//!
//! ```json
//! { "detail": "Contact not found" }
//! ```
//!
//! | Variant | Status |
//! |---------|--------|
//! | `BadRequest` | 400 |
//! | `MissingCredentials` | 401 (with a `WWW-Authenticate: Basic` challenge) |
//! | `Unauthorized` | 403 |
//! | `NotFound` | 404 |
//! | `RateLimited` | 429 (with `Retry-After`) |
//! | `Internal` | 500 |
//!
//! `Internal` carries the underlying cause for the server log only; clients
//! always see the same generic message.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Not authenticated")]
    MissingCredentials,

    #[error("Could not validate credentials")]
    Unauthorized,

    #[error("Rate limit exceeded: {limit}")]
    RateLimited { limit: String, retry_after_secs: u64 },

    #[error("Contact not found")]
    NotFound,

    #[error("Database error occurred.")]
    Internal(String),
}

impl LookupError {
    pub fn status(&self) -> StatusCode {
        match self {
            LookupError::BadRequest(_) => StatusCode::BAD_REQUEST,
            LookupError::MissingCredentials => StatusCode::UNAUTHORIZED,
            LookupError::Unauthorized => StatusCode::FORBIDDEN,
            LookupError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            LookupError::NotFound => StatusCode::NOT_FOUND,
            LookupError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: self.to_string(),
        };
        let mut response = (status, Json(body)).into_response();

        match self {
            LookupError::MissingCredentials => {
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Basic"),
                );
            }
            LookupError::RateLimited {
                retry_after_secs, ..
            } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            }
            _ => {}
        }

        response
    }
}
