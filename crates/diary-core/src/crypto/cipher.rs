//! AES-256-GCM payload encryption.
//!
//! Wire format (no version byte, no algorithm identifier):
//!
//! ```text
//! base64( salt[16] || iv[12] || ciphertext || tag[16] )
//! ```
//!
//! Salt and IV are drawn from the OS random source on every call, so the
//! same plaintext under the same password never encrypts to the same payload.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::key::{derive_key, SALT_LENGTH};
use crate::error::{CryptoUnavailableReason, DiaryError, Result};

/// Length of the AES-GCM nonce.
pub const IV_LENGTH: usize = 12;

/// Length of the AES-GCM authentication tag appended to the ciphertext.
pub const TAG_LENGTH: usize = 16;

/// Bytes in front of the ciphertext: salt then IV.
pub const HEADER_LENGTH: usize = SALT_LENGTH + IV_LENGTH;

/// A base64 string holding `salt || iv || ciphertext+tag`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedPayload(String);

impl EncryptedPayload {
    /// The base64 text as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for EncryptedPayload {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EncryptedPayload {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Debug for EncryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedPayload({} chars)", self.0.len())
    }
}

impl fmt::Display for EncryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fill `buf` from the OS random source.
///
/// # Errors
///
/// Returns `CryptoUnavailable(Unsupported)` if the platform cannot supply randomness.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|_| DiaryError::CryptoUnavailable(CryptoUnavailableReason::Unsupported))
}

/// Encrypt a UTF-8 string under a password.
///
/// A new salt and IV are generated for every call.
///
/// # Errors
///
/// Returns `CryptoUnavailable` if no random source is available, or `Crypto`
/// if the cipher rejects the input.
///
/// # Examples
///
/// ```
/// use diary_core::crypto::{decrypt, encrypt};
///
/// let payload = encrypt("hello world", "Abcd1234").unwrap();
/// assert_eq!(decrypt(&payload, "Abcd1234").unwrap(), "hello world");
/// ```
pub fn encrypt(plaintext: &str, password: &str) -> Result<EncryptedPayload> {
    let mut header = [0u8; HEADER_LENGTH];
    fill_random(&mut header)?;
    let (salt, iv) = header.split_at(SALT_LENGTH);

    let key = derive_key(password, salt)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| DiaryError::Crypto(format!("Invalid key length: {}", e)))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(iv), plaintext.as_bytes())
        .map_err(|_| DiaryError::Crypto("AES-GCM encryption failed".to_string()))?;

    let mut combined = Vec::with_capacity(HEADER_LENGTH + ciphertext.len());
    combined.extend_from_slice(&header);
    combined.extend_from_slice(&ciphertext);

    Ok(EncryptedPayload(STANDARD.encode(combined)))
}

/// Decrypt a payload produced by [`encrypt`].
///
/// # Errors
///
/// Returns `DecryptionFailed` for every failure: malformed base64, a buffer
/// shorter than the header, a tag mismatch (wrong password or tampering), or
/// plaintext that is not UTF-8. The cases are intentionally indistinguishable.
pub fn decrypt(payload: &EncryptedPayload, password: &str) -> Result<String> {
    let combined = STANDARD
        .decode(payload.as_str().trim())
        .map_err(|_| DiaryError::DecryptionFailed)?;
    if combined.len() < HEADER_LENGTH {
        return Err(DiaryError::DecryptionFailed);
    }

    let (salt, rest) = combined.split_at(SALT_LENGTH);
    let (iv, ciphertext) = rest.split_at(IV_LENGTH);

    let key = derive_key(password, salt).map_err(|_| DiaryError::DecryptionFailed)?;
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| DiaryError::DecryptionFailed)?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| DiaryError::DecryptionFailed)?,
    );

    String::from_utf8(plaintext.to_vec()).map_err(|_| DiaryError::DecryptionFailed)
}
