//! HTTP Basic authentication against a single configured key/password pair.
//!
//! Comparison never short-circuits on the first differing byte: both the
//! presented and the expected value are run through HMAC-SHA256 under a
//! per-process random key, and the tags are compared with `Mac::verify_slice`,
//! which is constant-time. Both fields are always checked, so timing does not
//! reveal which one was wrong.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

/// Credentials presented by a caller.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &format_args!("<{} chars>", self.password.chars().count()))
            .finish()
    }
}

/// Parses an `Authorization` header value of the form `Basic <base64>`.
///
/// Returns `None` for any other scheme, undecodable payload, non-UTF-8
/// payload, or a payload without a `:` separator.
pub fn parse_basic_header(value: &str) -> Option<BasicCredentials> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Verifies presented credentials against the configured pair.
pub struct CredentialVerifier {
    key: Vec<u8>,
    username_tag: Vec<u8>,
    password_tag: Vec<u8>,
}

impl CredentialVerifier {
    pub fn new(api_key: &str, api_password: &str) -> Self {
        let key = uuid::Uuid::new_v4().as_bytes().to_vec();
        let username_tag = hmac_sha256(&key, api_key.as_bytes());
        let password_tag = hmac_sha256(&key, api_password.as_bytes());
        Self {
            key,
            username_tag,
            password_tag,
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        Self::new(&auth.api_key, &auth.api_password)
    }

    /// True only when both username and password match.
    pub fn verify(&self, presented: &BasicCredentials) -> bool {
        let username_ok = self.matches(&self.username_tag, presented.username.as_bytes());
        let password_ok = self.matches(&self.password_tag, presented.password.as_bytes());
        username_ok & password_ok
    }

    fn matches(&self, expected_tag: &[u8], candidate: &[u8]) -> bool {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(candidate);
        mac.verify_slice(expected_tag).is_ok()
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
