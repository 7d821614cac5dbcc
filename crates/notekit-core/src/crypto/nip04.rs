use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use nostr_sdk::prelude::*;
use rand_core::{OsRng, RngCore};
use tracing::warn;

use super::{shared_secret, Bech32Dm, DecryptError, EncEncoding, EncryptError, IV_LEN};
use crate::constants::{hrp, kinds, BASE64_IV_MARKER, BECH32_IV_SEPARATOR};
use crate::ids::{decode_bech32_with, encode_bech32_with};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Encrypt `message` from `secret_key` to `public_key`.
///
/// A fresh IV is generated on every call, so identical inputs never produce
/// identical output.
pub fn encrypt_message(
    message: &str,
    secret_key: &SecretKey,
    public_key: &PublicKey,
    encoding: EncEncoding,
) -> Result<String, EncryptError> {
    let key = shared_secret(secret_key, public_key).ok_or(EncryptError::KeyAgreementFailure)?;

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext =
        Aes256CbcEnc::new(&key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(message.as_bytes());

    encode_dm(&ciphertext, &iv, encoding)
}

/// Decrypt content produced by [`encrypt_message`].
pub fn decrypt_content(
    content: &str,
    secret_key: &SecretKey,
    public_key: &PublicKey,
    encoding: EncEncoding,
) -> Result<String, DecryptError> {
    let key = shared_secret(secret_key, public_key).ok_or(DecryptError::SharedSecretFailure)?;
    let (ciphertext, iv) = decode_dm(content, encoding)?;

    let plaintext = Aes256CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| DecryptError::DecryptFailure)?;

    String::from_utf8(plaintext).map_err(|_| DecryptError::Utf8Failure)
}

/// Build a signed direct message to `to_pk`.
///
/// The recipient `p` tag comes first, followed by `tags`. Returns `None` when
/// the message cannot be encrypted or signed; the caller must treat that as
/// "not sendable", never as an empty message.
pub fn create_encrypted_event(
    message: &str,
    to_pk: &PublicKey,
    tags: Vec<Tag>,
    keys: &Keys,
    encoding: EncEncoding,
) -> Option<Event> {
    let content = match encrypt_message(message, keys.secret_key(), to_pk, encoding) {
        Ok(content) => content,
        Err(e) => {
            warn!(recipient = %to_pk, error = %e, "Failed to encrypt direct message");
            return None;
        }
    };

    let mut all_tags = Vec::with_capacity(tags.len() + 1);
    all_tags.push(Tag::public_key(*to_pk));
    all_tags.extend(tags);

    EventBuilder::new(Kind::from(kinds::DIRECT_MESSAGE), content)
        .tags(all_tags)
        .sign_with_keys(keys)
        .map_err(|e| warn!(error = %e, "Failed to sign direct message"))
        .ok()
}

/// Decrypt a direct-message event with our keys.
///
/// The counterparty is the author when we received the message, or the first
/// `p` tag when we sent it.
pub fn decrypt_event(
    event: &Event,
    keys: &Keys,
    encoding: EncEncoding,
) -> Result<String, DecryptError> {
    let counterparty = if event.pubkey == keys.public_key() {
        event
            .tags
            .public_keys()
            .next()
            .copied()
            .ok_or(DecryptError::SharedSecretFailure)?
    } else {
        event.pubkey
    };

    decrypt_content(&event.content, keys.secret_key(), &counterparty, encoding)
}

/// [`encrypt_message`] on the blocking pool, so it never stalls tasks
/// sharing the async executor.
pub async fn encrypt_message_async(
    message: String,
    secret_key: SecretKey,
    public_key: PublicKey,
    encoding: EncEncoding,
) -> Result<String, EncryptError> {
    tokio::task::spawn_blocking(move || {
        encrypt_message(&message, &secret_key, &public_key, encoding)
    })
    .await
    .map_err(|e| EncryptError::EncodeFailure(format!("encryption task failed: {}", e)))?
}

/// [`decrypt_content`] on the blocking pool.
pub async fn decrypt_content_async(
    content: String,
    secret_key: SecretKey,
    public_key: PublicKey,
    encoding: EncEncoding,
) -> Result<String, DecryptError> {
    tokio::task::spawn_blocking(move || {
        decrypt_content(&content, &secret_key, &public_key, encoding)
    })
    .await
    .map_err(|e| {
        warn!(error = %e, "Decryption task did not complete");
        DecryptError::DecryptFailure
    })?
}

fn encode_dm(ciphertext: &[u8], iv: &[u8; IV_LEN], encoding: EncEncoding) -> Result<String, EncryptError> {
    match encoding {
        EncEncoding::Base64 => Ok(format!(
            "{}{}{}",
            STANDARD.encode(ciphertext),
            BASE64_IV_MARKER,
            STANDARD.encode(iv)
        )),
        EncEncoding::Bech32 => {
            let content = encode_bech32_with::<Bech32Dm>(hrp::CIPHERTEXT, ciphertext)
                .map_err(|e| EncryptError::EncodeFailure(e.to_string()))?;
            let iv = encode_bech32_with::<Bech32Dm>(hrp::IV, iv)
                .map_err(|e| EncryptError::EncodeFailure(e.to_string()))?;
            Ok(format!("{}{}{}", content, BECH32_IV_SEPARATOR, iv))
        }
    }
}

fn decode_dm(content: &str, encoding: EncEncoding) -> Result<(Vec<u8>, [u8; IV_LEN]), DecryptError> {
    let (ciphertext, iv) = match encoding {
        EncEncoding::Base64 => {
            let (ct, iv) = content
                .split_once(BASE64_IV_MARKER)
                .ok_or(DecryptError::DecodeFailure)?;
            let ct = STANDARD.decode(ct).map_err(|_| DecryptError::DecodeFailure)?;
            let iv = STANDARD.decode(iv).map_err(|_| DecryptError::DecodeFailure)?;
            (ct, iv)
        }
        EncEncoding::Bech32 => {
            let (ct, iv) = content
                .split_once(BECH32_IV_SEPARATOR)
                .ok_or(DecryptError::DecodeFailure)?;
            let ct = decode_bech32_with::<Bech32Dm>(hrp::CIPHERTEXT, ct)
                .map_err(|_| DecryptError::DecodeFailure)?;
            let iv = decode_bech32_with::<Bech32Dm>(hrp::IV, iv)
                .map_err(|_| DecryptError::DecodeFailure)?;
            (ct, iv)
        }
    };

    let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| DecryptError::DecodeFailure)?;
    if ciphertext.is_empty() {
        return Err(DecryptError::DecodeFailure);
    }
    Ok((ciphertext, iv))
}
