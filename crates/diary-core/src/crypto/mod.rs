//! Cryptographic operations for Diary.
//!
//! - **PBKDF2-HMAC-SHA256** (100,000 iterations) turns a password plus a
//!   random salt into a one-time AES key
//! - **AES-256-GCM** seals each payload with a random 96-bit IV
//! - A **verification token** tests passwords without storing them
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the stored database file
//! - Offline inspection of stored entries
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Access to an unlocked session or process memory

pub mod cipher;
pub mod key;
pub mod password;
pub mod token;

pub use cipher::{decrypt, encrypt, EncryptedPayload};
pub use key::{derive_key, DerivedKey};
pub use password::{password_issues, validate_password, PasswordIssue};
pub use token::{PasswordToken, VERIFICATION_CONSTANT};

use crate::error::{CryptoUnavailableReason, DiaryError, Result};
use crate::platform::Origin;

/// Check that encryption can run for an app served from `origin`.
///
/// # Errors
///
/// - `CryptoUnavailable(InsecureContext)` when the origin is neither HTTPS nor localhost
/// - `CryptoUnavailable(Unsupported)` when the OS random source cannot be read
pub fn ensure_available(origin: &Origin) -> Result<()> {
    if !origin.is_secure_context() {
        return Err(DiaryError::CryptoUnavailable(
            CryptoUnavailableReason::InsecureContext,
        ));
    }
    let mut probe = [0u8; 1];
    cipher::fill_random(&mut probe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insecure_origin_reports_context() {
        let origin = Origin::parse("http://diary.example.org").unwrap();
        assert!(matches!(
            ensure_available(&origin),
            Err(DiaryError::CryptoUnavailable(
                CryptoUnavailableReason::InsecureContext
            ))
        ));
    }

    #[test]
    fn test_secure_origins_pass() {
        for origin in ["https://diary.example.org", "http://localhost:5173", "http://127.0.0.1"] {
            assert!(ensure_available(&Origin::parse(origin).unwrap()).is_ok());
        }
    }
}
