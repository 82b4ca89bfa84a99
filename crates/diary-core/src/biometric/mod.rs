//! Biometric unlock bridge.
//!
//! A platform credential acts as a gate over a password that is already
//! trusted for the current session. Registration caches that password in
//! volatile storage under [`BIOMETRIC_PASSWORD_KEY`]; a later successful
//! assertion releases it. No key material is ever derived from biometrics.
//!
//! States: `Unavailable -> Available -> Registered`, and per use
//! `Authenticating -> Released` inside [`BiometricBridge::authenticate`].

pub mod authenticator;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::SecretString;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::crypto::cipher::fill_random;
use crate::error::{DiaryError, Result};
use crate::platform::Origin;
use crate::session::VolatileStore;
use crate::settings::{keys, SettingsStore};

pub use authenticator::{
    Assertion, AssertionOptions, AuthenticatorAttachment, AuthenticatorError, CreatedCredential,
    CredentialCreationOptions, PlatformAuthenticator, RelyingParty, UserEntity, UserVerification,
    ALG_ES256, ALG_RS256, AUTHENTICATOR_TIMEOUT, CHALLENGE_LENGTH,
};

/// Volatile key for the password released by a biometric assertion.
pub const BIOMETRIC_PASSWORD_KEY: &str = "biometric_password";

/// Relying-party display name.
pub const RELYING_PARTY_NAME: &str = "Diary";

/// Persistent biometric state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricState {
    /// No usable platform authenticator for this origin.
    Unavailable,
    /// An authenticator exists but no credential is registered.
    Available,
    /// A credential is registered.
    Registered,
}

impl BiometricState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiometricState::Unavailable => "unavailable",
            BiometricState::Available => "available",
            BiometricState::Registered => "registered",
        }
    }
}

/// Clear biometric state without needing an authenticator.
pub fn revoke<S: SettingsStore, V: VolatileStore>(settings: S, volatile: V) -> Result<()> {
    settings.set_flag(keys::BIOMETRIC_ENABLED, false)?;
    settings.set_setting(keys::BIOMETRIC_CREDENTIAL, "")?;
    volatile.remove_item(BIOMETRIC_PASSWORD_KEY)?;
    info!("biometric unlock disabled");
    Ok(())
}

/// Replace the cached password if one is held. Returns whether it was replaced.
pub fn refresh_cached_password<V: VolatileStore>(volatile: V, password: &str) -> Result<bool> {
    if volatile.get_item(BIOMETRIC_PASSWORD_KEY)?.is_none() {
        return Ok(false);
    }
    volatile.set_item(BIOMETRIC_PASSWORD_KEY, password)?;
    Ok(true)
}

/// Registers platform credentials and trades assertions for the cached password.
pub struct BiometricBridge<S, V, A> {
    settings: S,
    volatile: V,
    authenticator: A,
    origin: Origin,
}

impl<S, V, A> BiometricBridge<S, V, A>
where
    S: SettingsStore,
    V: VolatileStore,
    A: PlatformAuthenticator,
{
    pub fn new(settings: S, volatile: V, authenticator: A, origin: Origin) -> Self {
        Self {
            settings,
            volatile,
            authenticator,
            origin,
        }
    }

    /// Capability probe: a supported authenticator on a secure, real hostname.
    pub fn is_available(&self) -> bool {
        self.origin.allows_platform_authenticator() && self.authenticator.is_supported()
    }

    /// Whether a credential is registered and enabled.
    pub fn is_enabled(&self) -> Result<bool> {
        Ok(self.settings.get_flag(keys::BIOMETRIC_ENABLED)? && self.credential_id()?.is_some())
    }

    pub fn state(&self) -> Result<BiometricState> {
        if !self.is_available() {
            return Ok(BiometricState::Unavailable);
        }
        if self.is_enabled()? {
            Ok(BiometricState::Registered)
        } else {
            Ok(BiometricState::Available)
        }
    }

    /// Whether the volatile password cache still holds a password.
    pub fn has_cached_password(&self) -> Result<bool> {
        Ok(self.volatile.get_item(BIOMETRIC_PASSWORD_KEY)?.is_some())
    }

    /// Create a platform credential and cache `password` behind it.
    ///
    /// Any previous registration is overwritten. Returns `Ok(false)` when the
    /// platform rejects the request (cancel, timeout, no authenticator); the
    /// request is never retried.
    ///
    /// # Errors
    ///
    /// Returns `BiometricUnavailable` when the capability probe is negative.
    pub fn register(&self, password: &str) -> Result<bool> {
        if !self.is_available() {
            return Err(DiaryError::BiometricUnavailable);
        }

        let mut challenge = [0u8; CHALLENGE_LENGTH];
        fill_random(&mut challenge)?;
        let options = CredentialCreationOptions {
            challenge,
            relying_party: RelyingParty {
                name: RELYING_PARTY_NAME.to_string(),
                id: self.origin.relying_party_id().map(str::to_string),
            },
            user: UserEntity {
                id: Uuid::new_v4().as_bytes().to_vec(),
                name: "diary-user".to_string(),
                display_name: "Diary User".to_string(),
            },
            algorithms: vec![ALG_ES256, ALG_RS256],
            attachment: AuthenticatorAttachment::Platform,
            user_verification: UserVerification::Required,
            timeout: AUTHENTICATOR_TIMEOUT,
        };

        let credential = match self.authenticator.create_credential(&options) {
            Ok(credential) => credential,
            Err(err) => {
                warn!("biometric registration failed: {}", err);
                return Ok(false);
            }
        };
        if credential.raw_id.is_empty() {
            warn!("authenticator returned an empty credential id");
            return Ok(false);
        }

        self.settings
            .set_setting(keys::BIOMETRIC_CREDENTIAL, &STANDARD.encode(&credential.raw_id))?;
        self.volatile.set_item(BIOMETRIC_PASSWORD_KEY, password)?;
        self.settings.set_flag(keys::BIOMETRIC_ENABLED, true)?;
        info!("biometric unlock registered");
        Ok(true)
    }

    /// Ask the authenticator for an assertion and release the cached password.
    ///
    /// Returns `Ok(None)` when the user cancels or the request times out;
    /// persisted state is left untouched in that case.
    ///
    /// # Errors
    ///
    /// - `BiometricUnavailable` if the capability probe is negative
    /// - `BiometricNotRegistered` if no credential is stored
    /// - `BiometricStaleCredential` if the credential exists but the cached password is gone
    /// - `Authenticator` for any other platform failure or an unexpected assertion
    pub fn authenticate(&self) -> Result<Option<SecretString>> {
        if !self.is_available() {
            return Err(DiaryError::BiometricUnavailable);
        }
        if !self.settings.get_flag(keys::BIOMETRIC_ENABLED)? {
            return Err(DiaryError::BiometricNotRegistered);
        }
        let credential_id = self
            .credential_id()?
            .ok_or(DiaryError::BiometricNotRegistered)?;
        let cached = self
            .volatile
            .get_item(BIOMETRIC_PASSWORD_KEY)?
            .ok_or(DiaryError::BiometricStaleCredential)?;

        let mut challenge = [0u8; CHALLENGE_LENGTH];
        fill_random(&mut challenge)?;
        let options = AssertionOptions {
            challenge,
            relying_party_id: self.origin.relying_party_id().map(str::to_string),
            allow_credentials: vec![credential_id.clone()],
            user_verification: UserVerification::Required,
            timeout: AUTHENTICATOR_TIMEOUT,
        };

        debug!("requesting biometric assertion");
        let assertion = match self.authenticator.get_assertion(&options) {
            Ok(assertion) => assertion,
            Err(err) if err.is_user_abort() => {
                debug!("biometric assertion aborted: {}", err);
                return Ok(None);
            }
            Err(err) => return Err(DiaryError::Authenticator(err.to_string())),
        };

        if assertion.credential_id != credential_id {
            return Err(DiaryError::Authenticator(
                "assertion used an unexpected credential".to_string(),
            ));
        }
        if !assertion.user_verified {
            return Err(DiaryError::Authenticator(
                "user verification was not performed".to_string(),
            ));
        }

        debug!("biometric assertion accepted");
        Ok(Some(SecretString::from(cached.as_str().to_owned())))
    }

    /// Revoke biometric unlock: flag, credential id, and cached password.
    pub fn disable(&self) -> Result<()> {
        revoke(&self.settings, &self.volatile)
    }

    fn credential_id(&self) -> Result<Option<Vec<u8>>> {
        match self.settings.get_setting(keys::BIOMETRIC_CREDENTIAL)? {
            Some(value) if !value.is_empty() => STANDARD
                .decode(value.as_bytes())
                .map(Some)
                .map_err(|e| DiaryError::Storage(format!("Invalid biometric credential: {}", e))),
            _ => Ok(None),
        }
    }
}
