//! Encrypted direct-message codec.
//!
//! A shared secret is derived with secp256k1 ECDH and used as an AES-256-CBC
//! key. Every encryption draws a fresh 16-byte IV from the OS RNG.

pub mod nip04;

pub use nip04::{
    create_encrypted_event, decrypt_content, decrypt_content_async, decrypt_event,
    encrypt_message, encrypt_message_async,
};

use std::fmt;
use std::str::FromStr;

use bech32::Checksum;
use nostr_sdk::prelude::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};

pub const IV_LEN: usize = 16;

/// Longest bech32 data part accepted for an encrypted message, in characters.
pub const BECH32_DM_CODE_LENGTH: usize = 1 << 20;

/// BIP-173 bech32 checksum with the code length raised to
/// [`BECH32_DM_CODE_LENGTH`]. Standard bech32 stops at 1023 characters,
/// which is roughly 600 bytes of plaintext.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bech32Dm {}

impl Checksum for Bech32Dm {
    type MidstateRepr = u32;
    const CODE_LENGTH: usize = BECH32_DM_CODE_LENGTH;
    const CHECKSUM_LENGTH: usize = 6;
    const GENERATOR_SH: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
    const TARGET_RESIDUE: u32 = 1;
}

/// Wire form of an encrypted message. Chosen by the caller, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncEncoding {
    /// `<base64 ciphertext>?iv=<base64 iv>`
    Base64,
    /// `<bech32 pzap ciphertext>_<bech32 iv>`
    Bech32,
}

impl fmt::Display for EncEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncEncoding::Base64 => f.write_str("base64"),
            EncEncoding::Bech32 => f.write_str("bech32"),
        }
    }
}

impl FromStr for EncEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base64" => Ok(EncEncoding::Base64),
            "bech32" => Ok(EncEncoding::Bech32),
            other => Err(format!("unknown encoding '{}', expected base64 or bech32", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncryptError {
    #[error("key agreement failed")]
    KeyAgreementFailure,
    #[error("failed to encode ciphertext: {0}")]
    EncodeFailure(String),
}

/// Every decryption failure is terminal; no partial plaintext is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecryptError {
    #[error("could not derive shared secret")]
    SharedSecretFailure,
    #[error("malformed encrypted content")]
    DecodeFailure,
    #[error("decryption failed")]
    DecryptFailure,
    #[error("decrypted content is not valid UTF-8")]
    Utf8Failure,
}

/// X coordinate of the ECDH point between `secret_key` and `public_key`.
/// Symmetric: `shared_secret(a, B) == shared_secret(b, A)`.
pub fn shared_secret(secret_key: &SecretKey, public_key: &PublicKey) -> Option<[u8; 32]> {
    nostr_sdk::util::generate_shared_key(secret_key, public_key).ok()
}
