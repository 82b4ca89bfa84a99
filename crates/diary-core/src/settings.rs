//! Persisted key/value settings.
//!
//! | Key | Value |
//! |---|---|
//! | `passwordTest` | verification token (base64 payload); absent means no password |
//! | `encryptionMode` | `"none"` or `"full"`; absent means `"none"` |
//! | `biometricEnabled` | `"true"` or `"false"` |
//! | `biometricCredential` | base64 credential id, `""` when disabled |
//! | `setupCompleted` | `"true"` once first-run setup finished |

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{DiaryError, Result};

/// Setting keys shared by every component that persists state.
pub mod keys {
    pub const PASSWORD_TEST: &str = "passwordTest";
    pub const ENCRYPTION_MODE: &str = "encryptionMode";
    pub const BIOMETRIC_ENABLED: &str = "biometricEnabled";
    pub const BIOMETRIC_CREDENTIAL: &str = "biometricCredential";
    pub const SETUP_COMPLETED: &str = "setupCompleted";
}

/// A durable key/value store for settings.
pub trait SettingsStore {
    /// Read a setting, `None` if it was never written.
    fn get_setting(&self, key: &str) -> Result<Option<String>>;

    /// Write a setting, replacing any previous value.
    fn set_setting(&self, key: &str, value: &str) -> Result<()>;

    /// Read a `"true"`/`"false"` flag; absent reads as `false`.
    fn get_flag(&self, key: &str) -> Result<bool> {
        Ok(self.get_setting(key)?.as_deref() == Some("true"))
    }

    fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        self.set_setting(key, if value { "true" } else { "false" })
    }
}

impl<T: SettingsStore + ?Sized> SettingsStore for &T {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        (**self).get_setting(key)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_setting(key, value)
    }
}

/// In-memory settings, for tests and ephemeral use.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| DiaryError::Storage("Settings lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| DiaryError::Storage("Settings lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
