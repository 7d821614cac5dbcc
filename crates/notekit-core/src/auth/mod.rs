//! Signed HTTP authorization tokens.
//!
//! Both schemes wrap a freshly signed event into
//! `Authorization: Nostr <base64(event json)>`. Tokens are bound to a single
//! request and must never be cached.

pub mod blossom;
pub mod nip98;

pub use blossom::{create_blossom_auth, BlossomAction};
pub use nip98::{authorization_header, create_http_auth, sign_request};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use nostr_sdk::prelude::Event;
use sha2::{Digest, Sha256};

pub const AUTH_SCHEME: &str = "Nostr";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization URL must be absolute: {0}")]
    RelativeUrl(String),
    #[error("HTTP method must not be empty")]
    EmptyMethod,
    #[error("failed to sign authorization event: {0}")]
    Sign(String),
    #[error("failed to serialize authorization event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// `Nostr <base64(json(event))>`
pub fn header_value(event: &Event) -> Result<String, AuthError> {
    let json = serde_json::to_string(event)?;
    Ok(format!("{} {}", AUTH_SCHEME, STANDARD.encode(json)))
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Parse an authorization header back into its event. Used by tests and by
/// the CLI to show what a header carries.
pub fn decode_header(value: &str) -> Option<Event> {
    let encoded = value.strip_prefix(AUTH_SCHEME)?.trim_start();
    let json = STANDARD.decode(encoded).ok()?;
    serde_json::from_slice(&json).ok()
}
