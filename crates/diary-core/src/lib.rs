//! # Diary Core
//!
//! Core library for Diary - a private, template-based personal diary whose
//! entries can be encrypted at rest with a password only the user knows.
//!
//! This crate provides the security core (key derivation, authenticated
//! encryption, password verification, sessions, encryption modes, biometric
//! unlock) and the storage it protects, independent of any front end.
//!
//! ## Architecture
//!
//! - **crypto**: PBKDF2 key derivation, AES-GCM payloads, verification token
//! - **session**: 24-hour sliding session in volatile storage
//! - **policy**: encryption modes (`none`, `full`)
//! - **biometric**: platform-authenticator gate over a cached password
//! - **storage**: storage engine trait and the SQLite implementation
//! - **vault**: auth orchestration, entry service, re-encryption passes

pub mod biometric;
pub mod blocks;
pub mod clock;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod platform;
pub mod policy;
pub mod session;
pub mod settings;
pub mod storage;
pub mod vault;

pub use error::{CryptoUnavailableReason, DiaryError, Result};
pub use platform::Origin;
pub use policy::EncryptionMode;
pub use storage::StorageEngine;
pub use vault::{DecryptedEntry, FreshAuth, Vault};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
