//! AES-256-GCM authenticated encryption
//!
//! The tag is carried separately from the ciphertext so sealed payloads can be
//! stored as `{ciphertext, iv, authTag}` documents.

use super::errors::{CryptoError, Result};
use super::random::random_bytes;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use serde::{Deserialize, Serialize};

/// AEAD key length in bytes
pub const KEY_LEN: usize = 32;

/// IV length in bytes
pub const IV_LEN: usize = NONCE_LEN;

/// Authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Encrypted payload with its IV and authentication tag, hex-encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedData {
    pub ciphertext: String,
    pub iv: String,
    pub auth_tag: String,
}

fn aead_key(key: &[u8]) -> Result<LessSafeKey> {
    if key.len() != KEY_LEN {
        return Err(CryptoError::InvalidKey(format!(
            "expected {} bytes, got {}",
            KEY_LEN,
            key.len()
        )));
    }
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| CryptoError::InvalidKey("rejected by AES-256-GCM".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

fn nonce(iv: &[u8]) -> Result<Nonce> {
    Nonce::try_assume_unique_for_key(iv).map_err(|_| CryptoError::InvalidIv {
        expected: IV_LEN,
        actual: iv.len(),
    })
}

/// Encrypt `plaintext` under `key`. A random IV is generated when none is given.
pub fn encrypt_aead(plaintext: &[u8], key: &[u8], iv: Option<&[u8]>) -> Result<SealedData> {
    let key = aead_key(key)?;
    let iv = match iv {
        Some(iv) => iv.to_vec(),
        None => random_bytes(IV_LEN)?,
    };

    let mut in_out = plaintext.to_vec();
    let tag = key
        .seal_in_place_separate_tag(nonce(&iv)?, Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(SealedData {
        ciphertext: hex::encode(&in_out),
        iv: hex::encode(&iv),
        auth_tag: hex::encode(tag.as_ref()),
    })
}

/// Decrypt a sealed payload. Fails with `DecryptionFailed` when the tag does not verify.
pub fn decrypt_aead(sealed: &SealedData, key: &[u8]) -> Result<Vec<u8>> {
    let key = aead_key(key)?;
    let iv = hex::decode(&sealed.iv).map_err(|e| CryptoError::Decode(e.to_string()))?;
    let tag = hex::decode(&sealed.auth_tag).map_err(|e| CryptoError::Decode(e.to_string()))?;
    if tag.len() != TAG_LEN {
        return Err(CryptoError::DecryptionFailed);
    }

    let mut in_out =
        hex::decode(&sealed.ciphertext).map_err(|e| CryptoError::Decode(e.to_string()))?;
    in_out.extend_from_slice(&tag);

    let plaintext = key
        .open_in_place(nonce(&iv)?, Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    Ok(plaintext.to_vec())
}
