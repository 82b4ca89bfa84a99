//! Platform authenticator interface.
//!
//! Mirrors the shape of a WebAuthn-style platform authenticator: credential
//! creation bound to a relying party, and assertions constrained to known
//! credential ids with mandatory user verification.

use std::time::Duration;

use thiserror::Error;

/// Upper bound the authenticator may spend waiting for the user.
pub const AUTHENTICATOR_TIMEOUT: Duration = Duration::from_secs(60);

/// Length of every challenge, in bytes.
pub const CHALLENGE_LENGTH: usize = 32;

/// COSE algorithm id for ECDSA with SHA-256.
pub const ALG_ES256: i64 = -7;

/// COSE algorithm id for RSASSA-PKCS1-v1_5 with SHA-256.
pub const ALG_RS256: i64 = -257;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserVerification {
    Required,
    Preferred,
    Discouraged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticatorAttachment {
    Platform,
    CrossPlatform,
}

/// The identity credentials are bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingParty {
    pub name: String,
    /// Hostname; `None` for loopback and IP hosts.
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntity {
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

/// Parameters for creating a new platform credential.
#[derive(Debug, Clone)]
pub struct CredentialCreationOptions {
    pub challenge: [u8; CHALLENGE_LENGTH],
    pub relying_party: RelyingParty,
    pub user: UserEntity,
    /// Acceptable public key algorithms, most preferred first.
    pub algorithms: Vec<i64>,
    pub attachment: AuthenticatorAttachment,
    pub user_verification: UserVerification,
    pub timeout: Duration,
}

/// Parameters for requesting an assertion.
#[derive(Debug, Clone)]
pub struct AssertionOptions {
    pub challenge: [u8; CHALLENGE_LENGTH],
    pub relying_party_id: Option<String>,
    pub allow_credentials: Vec<Vec<u8>>,
    pub user_verification: UserVerification,
    pub timeout: Duration,
}

/// A freshly created credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCredential {
    pub raw_id: Vec<u8>,
}

/// A successful assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub credential_id: Vec<u8>,
    pub user_verified: bool,
}

/// Why the authenticator did not complete a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticatorError {
    #[error("cancelled by user")]
    Cancelled,

    #[error("timed out waiting for the user")]
    TimedOut,

    #[error("no platform authenticator is available")]
    NoAuthenticator,

    #[error("request rejected: {0}")]
    Rejected(String),
}

impl AuthenticatorError {
    /// Cancel and timeout are the user walking away, not a failure.
    pub fn is_user_abort(&self) -> bool {
        matches!(self, AuthenticatorError::Cancelled | AuthenticatorError::TimedOut)
    }
}

/// A platform authenticator (fingerprint, face, device PIN).
pub trait PlatformAuthenticator {
    /// Whether the platform exposes an authenticator at all.
    fn is_supported(&self) -> bool;

    fn create_credential(
        &self,
        options: &CredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError>;

    fn get_assertion(&self, options: &AssertionOptions) -> Result<Assertion, AuthenticatorError>;
}

impl<T: PlatformAuthenticator + ?Sized> PlatformAuthenticator for &T {
    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    fn create_credential(
        &self,
        options: &CredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError> {
        (**self).create_credential(options)
    }

    fn get_assertion(&self, options: &AssertionOptions) -> Result<Assertion, AuthenticatorError> {
        (**self).get_assertion(options)
    }
}
