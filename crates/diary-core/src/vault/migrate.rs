//! Whole-diary re-encryption: password change and mode change.
//!
//! Each pass works through entries sequentially and writes every rewritten
//! payload plus the affected settings in a single storage transaction, so a
//! failure part way leaves the diary as it was.

use tracing::info;
use zeroize::Zeroizing;

use crate::biometric;
use crate::blocks::{extract_tags, parse_blocks};
use crate::clock::Clock;
use crate::crypto::{decrypt, encrypt, validate_password, PasswordToken};
use crate::error::{DiaryError, Result};
use crate::policy::EncryptionMode;
use crate::session::VolatileStore;
use crate::settings::keys;
use crate::storage::{EntryFilter, EntryRewrite, StorageEngine};

use super::{FreshAuth, Vault};

impl<S: StorageEngine, V: VolatileStore, C: Clock> Vault<S, V, C> {
    /// Replace the password and re-encrypt every encrypted entry under it.
    ///
    /// The session is reopened with the new password and a cached biometric
    /// password, if present, is replaced too.
    ///
    /// # Errors
    ///
    /// - `Validation` if `new_password` is too weak
    /// - `PasswordNotSet` / `IncorrectPassword` if `old_password` does not check
    /// - `DecryptionFailed` if an entry does not open under the old password
    pub fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        validate_password(new_password)?;
        let fresh = self.reauthenticate(old_password)?;
        self.change_password_with(fresh, new_password)
    }

    /// [`Vault::change_password`] with the old password already checked.
    ///
    /// # Errors
    ///
    /// - `Validation` if `new_password` is too weak
    /// - `DecryptionFailed` if an entry does not open under the old password
    pub fn change_password_with(&self, fresh: FreshAuth, new_password: &str) -> Result<()> {
        validate_password(new_password)?;

        let mut rewrites = Vec::new();
        for entry in self.store.list_entries(&EntryFilter::new())? {
            let Some(payload) = entry.payload() else {
                continue;
            };
            let json = Zeroizing::new(decrypt(&payload, fresh.password())?);
            rewrites.push(EntryRewrite {
                id: entry.id,
                data: encrypt(&json, new_password)?.into_string(),
                encrypted: true,
                tags: Vec::new(),
            });
        }

        let token = PasswordToken::create(new_password)?;
        self.store.rewrite_entries(
            &rewrites,
            &[(keys::PASSWORD_TEST, token.payload().as_str())],
        )?;
        self.session.open(new_password)?;
        biometric::refresh_cached_password(self.session.store(), new_password)?;

        info!(entries = rewrites.len(), "password changed");
        Ok(())
    }

    /// Switch the encryption mode, converting existing entries.
    ///
    /// `none -> full` encrypts every plaintext entry with the session
    /// password. `full -> none` needs a [`FreshAuth`], decrypts every entry,
    /// closes the session and revokes biometric unlock. Switching to the
    /// current mode does nothing.
    ///
    /// # Errors
    ///
    /// - `FreshAuthRequired` for a downgrade without proof
    /// - `PasswordNotSet` for an upgrade before a password exists
    /// - `Locked` for an upgrade without a valid session
    pub fn set_mode(&self, target: EncryptionMode, fresh: Option<FreshAuth>) -> Result<()> {
        let current = self.mode()?;
        if current == target {
            return Ok(());
        }
        self.check_mode_change(target, fresh.as_ref())?;

        match target {
            EncryptionMode::Full => self.encrypt_all(),
            EncryptionMode::None => {
                let fresh = fresh.ok_or(DiaryError::FreshAuthRequired)?;
                self.decrypt_all(&fresh)
            }
        }
    }

    fn encrypt_all(&self) -> Result<()> {
        let password = self.session_password()?;

        let mut rewrites = Vec::new();
        for entry in self.store.list_entries(&EntryFilter::new())? {
            if entry.encrypted {
                continue;
            }
            rewrites.push(EntryRewrite {
                id: entry.id,
                data: encrypt(&entry.data, &password)?.into_string(),
                encrypted: true,
                tags: Vec::new(),
            });
        }

        self.store.rewrite_entries(
            &rewrites,
            &[(keys::ENCRYPTION_MODE, EncryptionMode::Full.as_str())],
        )?;
        self.session.touch()?;

        info!(entries = rewrites.len(), "encryption mode set to full");
        Ok(())
    }

    fn decrypt_all(&self, fresh: &FreshAuth) -> Result<()> {
        let mut rewrites = Vec::new();
        for entry in self.store.list_entries(&EntryFilter::new())? {
            let Some(payload) = entry.payload() else {
                continue;
            };
            let json = decrypt(&payload, fresh.password())?;
            let tags = extract_tags(&parse_blocks(&json)?);
            rewrites.push(EntryRewrite {
                id: entry.id,
                data: json,
                encrypted: false,
                tags,
            });
        }

        // Biometric settings commit with the mode; only the cache is volatile.
        self.store.rewrite_entries(
            &rewrites,
            &[
                (keys::ENCRYPTION_MODE, EncryptionMode::None.as_str()),
                (keys::BIOMETRIC_ENABLED, "false"),
                (keys::BIOMETRIC_CREDENTIAL, ""),
            ],
        )?;
        self.session
            .store()
            .remove_item(biometric::BIOMETRIC_PASSWORD_KEY)?;
        self.session.close()?;

        info!(entries = rewrites.len(), "encryption mode set to none");
        Ok(())
    }
}
