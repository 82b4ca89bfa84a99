//! Password setup, unlock, lock and fresh authentication.

use std::fmt;

use secrecy::ExposeSecret;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::biometric::{BiometricBridge, PlatformAuthenticator};
use crate::clock::Clock;
use crate::crypto::{ensure_available, validate_password, EncryptedPayload, PasswordToken};
use crate::error::{DiaryError, Result};
use crate::policy::EncryptionMode;
use crate::session::VolatileStore;
use crate::settings::{keys, SettingsStore};

use super::Vault;

/// Proof that the password was checked just now.
///
/// Only [`Vault::reauthenticate`] creates one, and consuming operations take
/// it by value so it cannot be reused.
pub struct FreshAuth {
    password: Zeroizing<String>,
}

impl FreshAuth {
    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for FreshAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FreshAuth([REDACTED])")
    }
}

impl<S: SettingsStore, V: VolatileStore, C: Clock> Vault<S, V, C> {
    /// Whether a verification token exists.
    pub fn has_password(&self) -> Result<bool> {
        Ok(self.token()?.is_some())
    }

    /// Test `password` against the stored token. `false` when none is set.
    ///
    /// # Errors
    ///
    /// Returns `CryptoUnavailable` if encryption cannot run for this origin.
    pub fn check_password(&self, password: &str) -> Result<bool> {
        ensure_available(&self.origin)?;
        Ok(self
            .token()?
            .map(|token| token.verify(password))
            .unwrap_or(false))
    }

    /// First-time password setup: write the token and open a session.
    ///
    /// # Errors
    ///
    /// - `PasswordAlreadySet` if a token exists (use `change_password`)
    /// - `Validation` if the password is too weak
    pub fn set_password(&self, password: &str) -> Result<()> {
        if self.has_password()? {
            return Err(DiaryError::PasswordAlreadySet);
        }
        validate_password(password)?;
        ensure_available(&self.origin)?;

        let token = PasswordToken::create(password)?;
        self.store
            .set_setting(keys::PASSWORD_TEST, token.payload().as_str())?;
        self.session.open(password)?;
        info!("password set");
        Ok(())
    }

    /// Check `password` and open a session.
    ///
    /// # Errors
    ///
    /// - `PasswordNotSet` if no token exists
    /// - `IncorrectPassword` if the password does not match
    pub fn unlock(&self, password: &str) -> Result<()> {
        if !self.has_password()? {
            return Err(DiaryError::PasswordNotSet);
        }
        if !self.check_password(password)? {
            warn!("unlock rejected");
            return Err(DiaryError::IncorrectPassword);
        }
        self.session.open(password)?;
        info!("diary unlocked");
        Ok(())
    }

    /// Unlock with the password a biometric assertion releases.
    ///
    /// Returns `Ok(false)` when the user cancels the prompt.
    ///
    /// # Errors
    ///
    /// Everything [`BiometricBridge::authenticate`] reports, plus
    /// `BiometricStaleCredential` if the released password no longer matches.
    pub fn unlock_with_biometric<BS, BV, A>(
        &self,
        bridge: &BiometricBridge<BS, BV, A>,
    ) -> Result<bool>
    where
        BS: SettingsStore,
        BV: VolatileStore,
        A: PlatformAuthenticator,
    {
        let Some(password) = bridge.authenticate()? else {
            return Ok(false);
        };
        if !self.check_password(password.expose_secret())? {
            warn!("biometric cache holds an outdated password");
            return Err(DiaryError::BiometricStaleCredential);
        }
        self.session.open(password.expose_secret())?;
        info!("diary unlocked with biometrics");
        Ok(true)
    }

    /// Close the session.
    pub fn lock(&self) -> Result<()> {
        self.session.close()?;
        info!("diary locked");
        Ok(())
    }

    /// Mode `full` without a valid session.
    pub fn needs_unlock(&self) -> Result<bool> {
        Ok(self.mode()?.requires_unlock_at_start() && !self.session.is_valid()?)
    }

    /// Mode `full` but no password yet.
    pub fn needs_password_setup(&self) -> Result<bool> {
        Ok(self.mode()? == EncryptionMode::Full && !self.has_password()?)
    }

    /// The session password, only while the session is valid.
    ///
    /// # Errors
    ///
    /// Returns `Locked` when there is no valid session.
    pub fn session_password(&self) -> Result<Zeroizing<String>> {
        if !self.session.is_valid()? {
            return Err(DiaryError::Locked);
        }
        self.session.peek_password()?.ok_or(DiaryError::Locked)
    }

    /// Check `password` again regardless of the session state.
    ///
    /// # Errors
    ///
    /// - `PasswordNotSet` if no token exists
    /// - `IncorrectPassword` if the password does not match
    pub fn reauthenticate(&self, password: &str) -> Result<FreshAuth> {
        if !self.has_password()? {
            return Err(DiaryError::PasswordNotSet);
        }
        if !self.check_password(password)? {
            warn!("re-authentication rejected");
            return Err(DiaryError::IncorrectPassword);
        }
        debug!("fresh authentication granted");
        Ok(FreshAuth {
            password: Zeroizing::new(password.to_string()),
        })
    }

    /// Gate a mode change before any data is touched.
    ///
    /// # Errors
    ///
    /// - `FreshAuthRequired` for `full -> none` without proof
    /// - `PasswordNotSet` for `none -> full` before a password exists
    pub fn check_mode_change(
        &self,
        target: EncryptionMode,
        fresh: Option<&FreshAuth>,
    ) -> Result<()> {
        let current = self.mode()?;
        match (current, target) {
            (EncryptionMode::Full, EncryptionMode::None) if fresh.is_none() => {
                Err(DiaryError::FreshAuthRequired)
            }
            (EncryptionMode::None, EncryptionMode::Full) if !self.has_password()? => {
                Err(DiaryError::PasswordNotSet)
            }
            _ => Ok(()),
        }
    }

    fn token(&self) -> Result<Option<PasswordToken>> {
        Ok(self
            .store
            .get_setting(keys::PASSWORD_TEST)?
            .filter(|value| !value.is_empty())
            .map(|value| PasswordToken::from(EncryptedPayload::from(value))))
    }
}
