//! NIP-98 HTTP authentication

use nostr_sdk::prelude::*;
use reqwest::header::AUTHORIZATION;
use tracing::debug;

use super::{header_value, sha256_hex, AuthError};
use crate::constants::kinds;

/// Sign a kind 27235 event bound to `(url, method, sha256(body))`.
///
/// `url` must be absolute. The method is upper-cased. The `payload` tag is
/// only added when a body is supplied.
pub fn create_http_auth(
    keys: &Keys,
    url: &str,
    method: &str,
    body: Option<&[u8]>,
) -> Result<Event, AuthError> {
    if reqwest::Url::parse(url).is_err() {
        return Err(AuthError::RelativeUrl(url.to_string()));
    }
    let method = method.trim();
    if method.is_empty() {
        return Err(AuthError::EmptyMethod);
    }

    let mut builder = EventBuilder::new(Kind::from(kinds::HTTP_AUTH), "")
        .tag(Tag::custom(TagKind::custom("u"), [url]))
        .tag(Tag::custom(TagKind::custom("method"), [method.to_uppercase()]));

    if let Some(body) = body {
        builder = builder.tag(Tag::custom(TagKind::custom("payload"), [sha256_hex(body)]));
    }

    builder
        .sign_with_keys(keys)
        .map_err(|e| AuthError::Sign(e.to_string()))
}

/// Value for the `Authorization` header of a single request.
pub fn authorization_header(
    keys: &Keys,
    url: &str,
    method: &str,
    body: Option<&[u8]>,
) -> Result<String, AuthError> {
    let event = create_http_auth(keys, url, method, body)?;
    header_value(&event)
}

/// Attach a freshly signed `Authorization` header to `request`.
pub fn sign_request(
    request: reqwest::RequestBuilder,
    keys: &Keys,
    url: &str,
    method: &str,
    body: Option<&[u8]>,
) -> Result<reqwest::RequestBuilder, AuthError> {
    let header = authorization_header(keys, url, method, body)?;
    debug!(url, method, "Signed HTTP request");
    Ok(request.header(AUTHORIZATION, header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::decode_header;

    fn tag_value<'a>(event: &'a Event, key: &str) -> Option<&'a str> {
        event.tags.iter().find_map(|t| {
            let s = t.as_slice();
            (s.len() >= 2 && s[0] == key).then(|| s[1].as_str())
        })
    }

    #[test]
    fn test_http_auth_tags() {
        let keys = Keys::generate();
        let event = create_http_auth(&keys, "https://api.example.com/upload", "post", Some(b"hello"))
            .unwrap();

        assert_eq!(event.kind, Kind::from(27235));
        assert_eq!(tag_value(&event, "u"), Some("https://api.example.com/upload"));
        assert_eq!(tag_value(&event, "method"), Some("POST"));
        assert_eq!(
            tag_value(&event, "payload"),
            Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
        assert!(event.verify().is_ok());
    }

    #[test]
    fn test_no_payload_without_body() {
        let keys = Keys::generate();
        let event = create_http_auth(&keys, "https://api.example.com/", "GET", None).unwrap();
        assert_eq!(tag_value(&event, "payload"), None);
        assert_eq!(event.tags.len(), 2);
    }

    #[test]
    fn test_relative_url_rejected() {
        let keys = Keys::generate();
        assert!(matches!(
            create_http_auth(&keys, "/upload", "POST", None),
            Err(AuthError::RelativeUrl(_))
        ));
        assert!(matches!(
            create_http_auth(&keys, "https://x.com", " ", None),
            Err(AuthError::EmptyMethod)
        ));
    }

    #[test]
    fn test_header_round_trip_and_freshness() {
        let keys = Keys::generate();
        let a = authorization_header(&keys, "https://x.com/a", "GET", None).unwrap();
        let b = authorization_header(&keys, "https://x.com/a", "GET", None).unwrap();
        assert!(a.starts_with("Nostr "));

        let event_a = decode_header(&a).unwrap();
        let event_b = decode_header(&b).unwrap();
        assert_eq!(event_a.pubkey, keys.public_key());
        assert!(event_a.verify().is_ok());
        // Schnorr signatures use fresh aux randomness
        assert_ne!(event_a.sig, event_b.sig);
    }

    #[test]
    fn test_sign_request_attaches_header() {
        let keys = Keys::generate();
        let url = "https://api.example.com/items";
        let request = reqwest::Client::new().post(url).body("{}");
        let request = sign_request(request, &keys, url, "POST", Some(b"{}"))
            .unwrap()
            .build()
            .unwrap();

        let header = request.headers().get(AUTHORIZATION).unwrap().to_str().unwrap();
        let event = decode_header(header).unwrap();
        assert_eq!(tag_value(&event, "u"), Some(url));
        assert_eq!(tag_value(&event, "payload"), Some(sha256_hex(b"{}").as_str()));
    }
}
