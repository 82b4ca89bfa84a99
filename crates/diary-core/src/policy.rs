//! Encryption mode policy.
//!
//! One mode is active for the whole diary. The policy is a thin persisted
//! accessor; transition rules (fresh authentication before a downgrade) are
//! enforced by [`Vault`](crate::vault::Vault).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DiaryError, Result};
use crate::settings::{keys, SettingsStore};

/// Whether entry content is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionMode {
    /// Entries are stored as plaintext JSON; no password is ever required.
    #[default]
    None,
    /// Every entry payload is ciphertext; app start requires a valid session.
    Full,
}

impl EncryptionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionMode::None => "none",
            EncryptionMode::Full => "full",
        }
    }

    /// Whether the app must be unlocked before content is shown.
    pub fn requires_unlock_at_start(&self) -> bool {
        matches!(self, EncryptionMode::Full)
    }
}

impl fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncryptionMode {
    type Err = DiaryError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "none" => Ok(EncryptionMode::None),
            "full" => Ok(EncryptionMode::Full),
            other => Err(DiaryError::InvalidInput(format!(
                "Unknown encryption mode \"{}\" (expected none or full)",
                other
            ))),
        }
    }
}

/// True iff `mode` is `full`.
pub fn requires_unlock_at_start(mode: EncryptionMode) -> bool {
    mode.requires_unlock_at_start()
}

/// Persisted accessor for the active mode.
pub struct ModePolicy<S> {
    settings: S,
}

impl<S: SettingsStore> ModePolicy<S> {
    pub fn new(settings: S) -> Self {
        Self { settings }
    }

    /// The active mode, `none` when never set.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the persisted value is not a known mode.
    pub fn get_mode(&self) -> Result<EncryptionMode> {
        match self.settings.get_setting(keys::ENCRYPTION_MODE)? {
            None => Ok(EncryptionMode::None),
            Some(value) => value.parse().map_err(|_| {
                DiaryError::Storage(format!("Stored encryption mode \"{}\" is invalid", value))
            }),
        }
    }

    pub fn set_mode(&self, mode: EncryptionMode) -> Result<()> {
        self.settings
            .set_setting(keys::ENCRYPTION_MODE, mode.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    #[test]
    fn test_default_is_none() {
        let settings = MemorySettings::new();
        let policy = ModePolicy::new(&settings);
        assert_eq!(policy.get_mode().unwrap(), EncryptionMode::None);
    }

    #[test]
    fn test_set_and_get() {
        let settings = MemorySettings::new();
        let policy = ModePolicy::new(&settings);
        policy.set_mode(EncryptionMode::Full).unwrap();
        assert_eq!(policy.get_mode().unwrap(), EncryptionMode::Full);
        assert_eq!(
            settings.get_setting(keys::ENCRYPTION_MODE).unwrap().as_deref(),
            Some("full")
        );
    }

    #[test]
    fn test_requires_unlock_only_for_full() {
        assert!(requires_unlock_at_start(EncryptionMode::Full));
        assert!(!requires_unlock_at_start(EncryptionMode::None));
    }

    #[test]
    fn test_history_mode_is_not_a_mode() {
        assert!("history".parse::<EncryptionMode>().is_err());

        let settings = MemorySettings::new();
        settings.set_setting(keys::ENCRYPTION_MODE, "history").unwrap();
        let policy = ModePolicy::new(&settings);
        assert!(matches!(policy.get_mode(), Err(DiaryError::Storage(_))));
    }
}
