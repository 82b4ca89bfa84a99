use std::cell::Cell;

use diary_core::biometric::{
    Assertion, AssertionOptions, AuthenticatorError, BiometricBridge, BiometricState,
    CreatedCredential, CredentialCreationOptions, PlatformAuthenticator,
};
use diary_core::session::MemoryVolatileStore;
use diary_core::storage::SqliteStorage;
use diary_core::{DiaryError, EncryptionMode, Origin, Vault};

const PASSWORD: &str = "Correct1Horse";

/// Authenticator that approves everything unless told to cancel once.
#[derive(Default)]
struct ScriptedAuthenticator {
    cancel_next: Cell<bool>,
}

impl PlatformAuthenticator for ScriptedAuthenticator {
    fn is_supported(&self) -> bool {
        true
    }

    fn create_credential(
        &self,
        _options: &CredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError> {
        Ok(CreatedCredential {
            raw_id: b"credential-1".to_vec(),
        })
    }

    fn get_assertion(&self, options: &AssertionOptions) -> Result<Assertion, AuthenticatorError> {
        if self.cancel_next.replace(false) {
            return Err(AuthenticatorError::Cancelled);
        }
        Ok(Assertion {
            credential_id: options.allow_credentials[0].clone(),
            user_verified: true,
        })
    }
}

fn origin() -> Origin {
    Origin::parse("https://diary.example.org").expect("origin should parse")
}

#[test]
fn test_biometric_unlock_after_lock() {
    let storage = SqliteStorage::open_in_memory().expect("storage should open");
    let volatile = MemoryVolatileStore::new();
    let authenticator = ScriptedAuthenticator::default();
    let vault = Vault::new(&storage, &volatile, origin());
    let bridge = BiometricBridge::new(&storage, &volatile, &authenticator, origin());

    vault.set_password(PASSWORD).expect("set password should succeed");
    vault
        .set_mode(EncryptionMode::Full, None)
        .expect("upgrade should succeed");
    let password = vault.session_password().expect("session should be valid");
    assert!(bridge.register(&password).expect("register should succeed"));
    assert_eq!(bridge.state().expect("state should read"), BiometricState::Registered);

    vault.lock().expect("lock should succeed");
    assert!(vault.needs_unlock().expect("status should read"));

    authenticator.cancel_next.set(true);
    assert!(!vault
        .unlock_with_biometric(&bridge)
        .expect("cancel is not an error"));
    assert!(vault.needs_unlock().expect("status should read"));

    assert!(vault
        .unlock_with_biometric(&bridge)
        .expect("unlock should succeed"));
    assert!(!vault.needs_unlock().expect("status should read"));
}

#[test]
fn test_closed_tab_leaves_stale_credential() {
    let storage = SqliteStorage::open_in_memory().expect("storage should open");
    let volatile = MemoryVolatileStore::new();
    let authenticator = ScriptedAuthenticator::default();
    let vault = Vault::new(&storage, &volatile, origin());
    let bridge = BiometricBridge::new(&storage, &volatile, &authenticator, origin());

    vault.set_password(PASSWORD).expect("set password should succeed");
    assert!(bridge.register(PASSWORD).expect("register should succeed"));

    volatile.clear().expect("clear should succeed");

    assert_eq!(bridge.state().expect("state should read"), BiometricState::Registered);
    assert!(!bridge.has_cached_password().expect("cache should read"));
    assert!(matches!(
        vault.unlock_with_biometric(&bridge),
        Err(DiaryError::BiometricStaleCredential)
    ));
}

#[test]
fn test_password_change_refreshes_cache() {
    let storage = SqliteStorage::open_in_memory().expect("storage should open");
    let volatile = MemoryVolatileStore::new();
    let authenticator = ScriptedAuthenticator::default();
    let vault = Vault::new(&storage, &volatile, origin());
    let bridge = BiometricBridge::new(&storage, &volatile, &authenticator, origin());

    vault.set_password(PASSWORD).expect("set password should succeed");
    assert!(bridge.register(PASSWORD).expect("register should succeed"));
    vault
        .change_password(PASSWORD, "Battery2Staple")
        .expect("change should succeed");
    vault.lock().expect("lock should succeed");

    assert!(vault
        .unlock_with_biometric(&bridge)
        .expect("unlock should succeed"));
    assert_eq!(
        vault.session_password().expect("session should be valid").as_str(),
        "Battery2Staple"
    );
}

#[test]
fn test_downgrade_disables_biometrics() {
    let storage = SqliteStorage::open_in_memory().expect("storage should open");
    let volatile = MemoryVolatileStore::new();
    let authenticator = ScriptedAuthenticator::default();
    let vault = Vault::new(&storage, &volatile, origin());
    let bridge = BiometricBridge::new(&storage, &volatile, &authenticator, origin());

    vault.set_password(PASSWORD).expect("set password should succeed");
    vault
        .set_mode(EncryptionMode::Full, None)
        .expect("upgrade should succeed");
    assert!(bridge.register(PASSWORD).expect("register should succeed"));

    let fresh = vault.reauthenticate(PASSWORD).expect("reauth should succeed");
    vault
        .set_mode(EncryptionMode::None, Some(fresh))
        .expect("downgrade should succeed");

    assert_eq!(bridge.state().expect("state should read"), BiometricState::Available);
    assert!(matches!(
        bridge.authenticate(),
        Err(DiaryError::BiometricNotRegistered)
    ));
}
