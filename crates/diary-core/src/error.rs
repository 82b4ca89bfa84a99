//! Error types for Diary core operations.
//!
//! Every failure the core can report is a variant of [`DiaryError`], so callers
//! branch on the kind instead of matching message text. The CLI layer maps
//! these to user-facing messages and exit codes.

use std::fmt;

use thiserror::Error;

/// Result type alias for Diary operations.
pub type Result<T> = std::result::Result<T, DiaryError>;

/// Why platform cryptography could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoUnavailableReason {
    /// The app is not served from a secure context (HTTPS or localhost).
    InsecureContext,
    /// The platform does not expose a usable random source or cipher.
    Unsupported,
}

impl fmt::Display for CryptoUnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoUnavailableReason::InsecureContext => write!(
                f,
                "encryption requires a secure context; serve the app over HTTPS or from localhost"
            ),
            CryptoUnavailableReason::Unsupported => write!(
                f,
                "this platform does not provide the required cryptographic primitives"
            ),
        }
    }
}

/// Core error type for Diary operations.
#[derive(Debug, Error)]
pub enum DiaryError {
    /// Platform cryptographic primitives are not available
    #[error("Cryptography unavailable: {0}")]
    CryptoUnavailable(CryptoUnavailableReason),

    /// Wrong password or corrupted payload (deliberately indistinguishable)
    #[error("Decryption failed: wrong password or corrupted data")]
    DecryptionFailed,

    /// Encryption failed after the key was derived
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// The candidate password did not match the verification token
    #[error("Incorrect password")]
    IncorrectPassword,

    /// Encryption is enabled but no password has been created yet
    #[error("No password has been set")]
    PasswordNotSet,

    /// A password already exists; use the change-password flow
    #[error("A password is already set")]
    PasswordAlreadySet,

    /// Encrypted content requested without a valid session
    #[error("Diary is locked; unlock with your password first")]
    Locked,

    /// A protection downgrade was attempted without re-entering the password
    #[error("This change requires re-entering your password")]
    FreshAuthRequired,

    /// Biometric unlock is not possible on this host
    #[error("Biometric unlock is not available on this device or host")]
    BiometricUnavailable,

    /// Credential exists but the cached password is gone
    #[error("Biometric unlock expired with the previous session; unlock with your password and enable biometrics again")]
    BiometricStaleCredential,

    /// No biometric credential has been registered
    #[error("Biometric unlock is not enabled")]
    BiometricNotRegistered,

    /// The platform authenticator failed for a reason other than cancellation
    #[error("Authenticator error: {0}")]
    Authenticator(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error (fallback)
    #[error("{0}")]
    Other(String),
}

impl DiaryError {
    /// True for errors a user resolves by entering the password again.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            DiaryError::DecryptionFailed | DiaryError::IncorrectPassword
        )
    }
}

impl From<std::io::Error> for DiaryError {
    fn from(err: std::io::Error) -> Self {
        DiaryError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DiaryError {
    fn from(err: serde_json::Error) -> Self {
        DiaryError::Validation(err.to_string())
    }
}

impl From<rusqlite::Error> for DiaryError {
    fn from(err: rusqlite::Error) -> Self {
        DiaryError::Storage(err.to_string())
    }
}
