//! Password verification token.
//!
//! The token is a known constant encrypted under the user's password. It is
//! never decrypted for its content; a successful decryption is the proof that
//! a candidate password is correct.

use crate::crypto::cipher::{decrypt, encrypt, EncryptedPayload};
use crate::error::Result;

/// Plaintext sealed inside every verification token.
pub const VERIFICATION_CONSTANT: &str = "PASSWORD_VERIFICATION_TEST";

/// Ciphertext that lets the system test a password without storing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordToken(EncryptedPayload);

impl PasswordToken {
    /// Seal the verification constant under `password`.
    pub fn create(password: &str) -> Result<Self> {
        Ok(Self(encrypt(VERIFICATION_CONSTANT, password)?))
    }

    /// True iff `candidate` decrypts the token.
    ///
    /// Wrong password and corrupted token both yield `false`.
    pub fn verify(&self, candidate: &str) -> bool {
        decrypt(&self.0, candidate).is_ok()
    }

    pub fn payload(&self) -> &EncryptedPayload {
        &self.0
    }
}

impl From<EncryptedPayload> for PasswordToken {
    fn from(payload: EncryptedPayload) -> Self {
        Self(payload)
    }
}
