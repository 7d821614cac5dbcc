//! Fixed-length 32-byte identifiers with hex and bech32 codecs.
//!
//! Every identifier is exactly [`ID_LEN`] bytes. Equality and hashing are by
//! raw bytes, so two ids decoded from differently-cased hex compare equal.

use std::fmt;
use std::str::FromStr;

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Checksum, Hrp};
use nostr_sdk::prelude::{EventId, PublicKey, SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::hrp;

pub const ID_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("identifier must be {ID_LEN} bytes, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex identifier")]
    InvalidHex,
    #[error("invalid bech32 string: {0}")]
    InvalidBech32(String),
    #[error("bech32 encoding failed: {0}")]
    EncodeFailure(String),
    #[error("expected bech32 prefix '{expected}', found '{found}'")]
    WrongPrefix {
        expected: &'static str,
        found: String,
    },
    #[error("bytes are not a valid secp256k1 key")]
    InvalidKey,
}

/// Encode `data` as bech32 under the given human-readable prefix.
pub(crate) fn encode_bech32(prefix: &str, data: &[u8]) -> Result<String, IdError> {
    encode_bech32_with::<Bech32>(prefix, data)
}

/// Decode a bech32 string, requiring the given human-readable prefix.
pub(crate) fn decode_bech32(expected: &'static str, s: &str) -> Result<Vec<u8>, IdError> {
    decode_bech32_with::<Bech32>(expected, s)
}

/// [`encode_bech32`] under checksum `Ck`, which also fixes the maximum length.
pub(crate) fn encode_bech32_with<Ck: Checksum>(
    prefix: &str,
    data: &[u8],
) -> Result<String, IdError> {
    let hrp = Hrp::parse(prefix).map_err(|e| IdError::EncodeFailure(e.to_string()))?;
    bech32::encode::<Ck>(hrp, data).map_err(|e| IdError::EncodeFailure(e.to_string()))
}

pub(crate) fn decode_bech32_with<Ck: Checksum>(
    expected: &'static str,
    s: &str,
) -> Result<Vec<u8>, IdError> {
    let checked =
        CheckedHrpstring::new::<Ck>(s).map_err(|e| IdError::InvalidBech32(e.to_string()))?;
    let found = checked.hrp().to_string();
    if !found.eq_ignore_ascii_case(expected) {
        return Err(IdError::WrongPrefix { expected, found });
    }
    Ok(checked.byte_iter().collect())
}

fn bytes_from_slice(bytes: &[u8]) -> Result<[u8; ID_LEN], IdError> {
    <[u8; ID_LEN]>::try_from(bytes).map_err(|_| IdError::InvalidLength(bytes.len()))
}

fn bytes_from_hex(s: &str) -> Result<[u8; ID_LEN], IdError> {
    let mut out = [0u8; ID_LEN];
    hex::decode_to_slice(s, &mut out).map_err(|_| IdError::InvalidHex)?;
    Ok(out)
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, hrp = $hrp:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; ID_LEN]);

        impl $name {
            /// Human-readable prefix of the bech32 form
            pub const HRP: &'static str = $hrp;

            pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
                Self(bytes)
            }

            /// Fails with [`IdError::InvalidLength`] unless `bytes` is exactly 32 bytes.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, IdError> {
                bytes_from_slice(bytes).map(Self)
            }

            pub fn as_bytes(&self) -> &[u8; ID_LEN] {
                &self.0
            }

            /// 64-char lowercase hex
            pub fn hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Fails with [`IdError::InvalidHex`] on malformed or wrong-length input.
            pub fn from_hex(s: &str) -> Result<Self, IdError> {
                bytes_from_hex(s).map(Self)
            }

            pub fn to_bech32(&self) -> Result<String, IdError> {
                encode_bech32(Self::HRP, &self.0)
            }

            pub fn from_bech32(s: &str) -> Result<Self, IdError> {
                let data = decode_bech32(Self::HRP, s)?;
                Self::from_slice(&data)
            }
        }

        impl From<[u8; ID_LEN]> for $name {
            fn from(bytes: [u8; ID_LEN]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = IdError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                Self::from_slice(bytes)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            /// Accepts either the hex form or the bech32 form
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.len() == ID_LEN * 2 {
                    Self::from_hex(s)
                } else {
                    Self::from_bech32(s)
                }
            }
        }
    };
}

macro_rules! public_id {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

define_id!(
    /// Id of a note (event). Tagged by `e`.
    NoteId,
    hrp = hrp::NOTE
);
define_id!(
    /// Public key of an author. Tagged by `p`.
    Pubkey,
    hrp = hrp::NPUB
);
define_id!(
    /// Id of a quoted note. Tagged by `q`, shares the `note` bech32 prefix.
    QuoteId,
    hrp = hrp::NOTE
);
define_id!(
    /// Secret key bytes. Never printed.
    Privkey,
    hrp = hrp::NSEC
);

public_id!(NoteId);
public_id!(Pubkey);
public_id!(QuoteId);

impl NoteId {
    pub const KEY: &'static str = "e";
}

impl Pubkey {
    pub const KEY: &'static str = "p";

    pub fn to_public_key(&self) -> Result<PublicKey, IdError> {
        PublicKey::from_slice(&self.0).map_err(|_| IdError::InvalidKey)
    }
}

impl QuoteId {
    pub const KEY: &'static str = "q";

    pub fn note_id(&self) -> NoteId {
        NoteId(self.0)
    }
}

impl Privkey {
    pub fn to_secret_key(&self) -> Result<SecretKey, IdError> {
        SecretKey::from_slice(&self.0).map_err(|_| IdError::InvalidKey)
    }
}

impl fmt::Debug for Privkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Privkey(<redacted>)")
    }
}

impl From<EventId> for NoteId {
    fn from(id: EventId) -> Self {
        Self(id.to_bytes())
    }
}

impl From<&EventId> for NoteId {
    fn from(id: &EventId) -> Self {
        Self(id.to_bytes())
    }
}

impl From<NoteId> for EventId {
    fn from(id: NoteId) -> Self {
        EventId::from_byte_array(id.0)
    }
}

impl From<PublicKey> for Pubkey {
    fn from(pk: PublicKey) -> Self {
        Self(pk.to_bytes())
    }
}

impl From<&PublicKey> for Pubkey {
    fn from(pk: &PublicKey) -> Self {
        Self(pk.to_bytes())
    }
}

impl TryFrom<Pubkey> for PublicKey {
    type Error = IdError;

    fn try_from(pk: Pubkey) -> Result<Self, Self::Error> {
        pk.to_public_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_sdk::prelude::*;

    const HEX: &str = "7c7d37bc8c04d2ec65cbc7d9275253e6b5cc34b5d10439f158194a3feefa8d52";

    #[test]
    fn test_construct_requires_exactly_32_bytes() {
        for len in [0usize, 1, 16, 31, 33, 64] {
            let bytes = vec![7u8; len];
            assert_eq!(NoteId::from_slice(&bytes), Err(IdError::InvalidLength(len)));
            assert_eq!(Pubkey::from_slice(&bytes), Err(IdError::InvalidLength(len)));
        }
        assert!(NoteId::from_slice(&[7u8; 32]).is_ok());
    }

    #[test]
    fn test_hex_round_trip() {
        let id = NoteId::from_hex(HEX).unwrap();
        assert_eq!(id.hex(), HEX);
        assert_eq!(id.hex().len(), 64);
        assert_eq!(NoteId::from_hex(&id.hex()).unwrap(), id);
    }

    #[test]
    fn test_uppercase_hex_decodes_to_lowercase() {
        let id = NoteId::from_hex(&HEX.to_uppercase()).unwrap();
        assert_eq!(id.hex(), HEX);
    }

    #[test]
    fn test_from_hex_rejects_malformed_and_wrong_length() {
        assert_eq!(NoteId::from_hex("zz"), Err(IdError::InvalidHex));
        assert_eq!(NoteId::from_hex(&HEX[..62]), Err(IdError::InvalidHex));
        assert_eq!(NoteId::from_hex(&format!("{}00", HEX)), Err(IdError::InvalidHex));
        let mut bad = HEX.to_string();
        bad.replace_range(0..1, "g");
        assert_eq!(NoteId::from_hex(&bad), Err(IdError::InvalidHex));
    }

    #[test]
    fn test_bech32_matches_nostr_sdk() {
        let keys = Keys::generate();
        let pubkey = Pubkey::from(keys.public_key());
        assert_eq!(pubkey.to_bech32().unwrap(), keys.public_key().to_bech32().unwrap());

        let event = EventBuilder::text_note("hello").sign_with_keys(&keys).unwrap();
        let note_id = NoteId::from(event.id);
        let bech = note_id.to_bech32().unwrap();
        assert!(bech.starts_with("note1"));
        assert_eq!(bech, event.id.to_bech32().unwrap());
        assert_eq!(NoteId::from_bech32(&bech).unwrap(), note_id);
    }

    #[test]
    fn test_bech32_wrong_prefix_rejected() {
        let keys = Keys::generate();
        let npub = keys.public_key().to_bech32().unwrap();
        assert!(matches!(
            NoteId::from_bech32(&npub),
            Err(IdError::WrongPrefix { expected: "note", .. })
        ));
        assert!(matches!(
            Pubkey::from_bech32("npub1notbech32"),
            Err(IdError::InvalidBech32(_))
        ));
    }

    #[test]
    fn test_bech32_encode_errors_are_not_parse_errors() {
        assert!(matches!(
            encode_bech32("note", &[7u8; 2000]),
            Err(IdError::EncodeFailure(_))
        ));
        assert!(matches!(
            encode_bech32("", &[7u8; 32]),
            Err(IdError::EncodeFailure(_))
        ));
    }

    #[test]
    fn test_long_checksum_agrees_with_standard_bech32() {
        use crate::crypto::Bech32Dm;

        let data = [9u8; 32];
        let standard = encode_bech32("note", &data).unwrap();
        let long = encode_bech32_with::<Bech32Dm>("note", &data).unwrap();
        assert_eq!(standard, long);
        assert_eq!(decode_bech32_with::<Bech32Dm>("note", &standard).unwrap(), data);

        let big = vec![1u8; 2000];
        let encoded = encode_bech32_with::<Bech32Dm>("pzap", &big).unwrap();
        assert_eq!(decode_bech32_with::<Bech32Dm>("pzap", &encoded).unwrap(), big);
    }

    #[test]
    fn test_from_str_accepts_hex_or_bech32() {
        let id: NoteId = HEX.parse().unwrap();
        let bech = id.to_bech32().unwrap();
        let again: NoteId = bech.parse().unwrap();
        assert_eq!(id, again);
    }

    #[test]
    fn test_nsec_decodes_to_same_key() {
        let keys = Keys::generate();
        let nsec = keys.secret_key().to_bech32().unwrap();
        let privkey = Privkey::from_bech32(&nsec).unwrap();
        let secret = privkey.to_secret_key().unwrap();
        assert_eq!(Keys::new(secret).public_key(), keys.public_key());
        assert_eq!(format!("{:?}", privkey), "Privkey(<redacted>)");
    }

    #[test]
    fn test_event_id_conversion_round_trip() {
        let id = NoteId::from_hex(HEX).unwrap();
        let event_id: EventId = id.into();
        assert_eq!(event_id.to_hex(), HEX);
        assert_eq!(NoteId::from(event_id), id);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let id = Pubkey::from_hex(HEX).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", HEX));
        let back: Pubkey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<Pubkey>("\"abcd\"").is_err());
    }

    #[test]
    fn test_quote_id_shares_note_bytes() {
        let quote = QuoteId::from_hex(HEX).unwrap();
        assert_eq!(quote.note_id().hex(), HEX);
    }
}
