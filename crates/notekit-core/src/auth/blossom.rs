//! Blossom (BUD-01) authorization events
//!
//! Blossom servers authenticate by action and blob hash rather than by URL.
//! See: https://github.com/hzrd149/blossom

use nostr_sdk::prelude::*;

use super::{header_value, AuthError};
use crate::constants::kinds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlossomAction {
    Upload,
    Delete,
    List,
    Get,
}

impl BlossomAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlossomAction::Upload => "upload",
            BlossomAction::Delete => "delete",
            BlossomAction::List => "list",
            BlossomAction::Get => "get",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            BlossomAction::Upload => "Upload blob",
            BlossomAction::Delete => "Delete blob",
            BlossomAction::List => "List blobs",
            BlossomAction::Get => "Get blob",
        }
    }
}

/// Sign a kind 24242 event for `action`, expiring `ttl_secs` from now.
/// `sha256_hex` is the hash of the referenced blob, if any.
pub fn create_blossom_auth(
    keys: &Keys,
    action: BlossomAction,
    sha256_hex: Option<&str>,
    ttl_secs: u64,
) -> Result<Event, AuthError> {
    let expiration = Timestamp::from(Timestamp::now().as_secs() + ttl_secs);

    let mut builder = EventBuilder::new(Kind::from(kinds::BLOSSOM_AUTH), action.description())
        .tag(Tag::custom(TagKind::custom("t"), [action.as_str()]))
        .tag(Tag::expiration(expiration));

    if let Some(hash) = sha256_hex {
        builder = builder.tag(Tag::custom(TagKind::custom("x"), [hash]));
    }

    builder
        .sign_with_keys(keys)
        .map_err(|e| AuthError::Sign(e.to_string()))
}

/// Header value for a Blossom request.
pub fn blossom_header(
    keys: &Keys,
    action: BlossomAction,
    sha256_hex: Option<&str>,
    ttl_secs: u64,
) -> Result<String, AuthError> {
    let event = create_blossom_auth(keys, action, sha256_hex, ttl_secs)?;
    header_value(&event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{decode_header, sha256_hex};
    use crate::constants::BLOSSOM_AUTH_TTL_SECS;

    fn values(event: &Event, key: &str) -> Vec<String> {
        event
            .tags
            .iter()
            .map(|t| t.as_slice())
            .filter(|s| s.len() >= 2 && s[0] == key)
            .map(|s| s[1].clone())
            .collect()
    }

    #[test]
    fn test_upload_auth() {
        let keys = Keys::generate();
        let hash = sha256_hex(b"image bytes");
        let event =
            create_blossom_auth(&keys, BlossomAction::Upload, Some(&hash), BLOSSOM_AUTH_TTL_SECS)
                .unwrap();

        assert_eq!(event.kind, Kind::from(24242));
        assert_eq!(event.content, "Upload blob");
        assert_eq!(values(&event, "t"), vec!["upload"]);
        assert_eq!(values(&event, "x"), vec![hash]);

        let expiration: u64 = values(&event, "expiration")[0].parse().unwrap();
        assert!(expiration >= event.created_at.as_secs() + BLOSSOM_AUTH_TTL_SECS);
        assert!(expiration <= event.created_at.as_secs() + BLOSSOM_AUTH_TTL_SECS + 5);
    }

    #[test]
    fn test_list_auth_has_no_hash() {
        let keys = Keys::generate();
        let header = blossom_header(&keys, BlossomAction::List, None, 60).unwrap();
        let event = decode_header(&header).unwrap();
        assert!(values(&event, "x").is_empty());
        assert_eq!(values(&event, "t"), vec!["list"]);
        assert!(event.verify().is_ok());
    }
}
