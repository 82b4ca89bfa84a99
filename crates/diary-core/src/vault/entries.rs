//! Entry service: save, read, list and export with mode-aware encryption.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::blocks::{extract_tags, parse_blocks, Block};
use crate::clock::Clock;
use crate::crypto::{decrypt, encrypt};
use crate::error::{DiaryError, Result};
use crate::policy::EncryptionMode;
use crate::session::VolatileStore;
use crate::storage::{Entry, EntryFilter, NewEntry, StorageEngine};

use super::Vault;

/// An entry with its blocks in the clear, as exported.
#[derive(Debug, Clone, Serialize)]
pub struct DecryptedEntry {
    pub id: Uuid,
    pub template_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub encrypted: bool,
    pub tags: Vec<String>,
    pub blocks: Vec<Block>,
}

impl<S: StorageEngine, V: VolatileStore, C: Clock> Vault<S, V, C> {
    /// Store a filled-in entry, encrypting it when the mode is `full`.
    ///
    /// In `full` mode a successful save slides the session window forward.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the template does not exist
    /// - `Locked` in `full` mode without a valid session
    pub fn save_entry(
        &self,
        template_id: Uuid,
        blocks: &[Block],
        created_at: Option<DateTime<Utc>>,
    ) -> Result<Uuid> {
        if self.store.get_template_by_id(&template_id)?.is_none() {
            return Err(DiaryError::NotFound(format!("Template {}", template_id)));
        }
        let json = Zeroizing::new(serde_json::to_string(blocks)?);

        let mut entry = match self.mode()? {
            EncryptionMode::Full => {
                let password = self.session_password()?;
                let payload = encrypt(&json, &password)?;
                NewEntry::encrypted(template_id, payload)
            }
            EncryptionMode::None => {
                NewEntry::plaintext(template_id, (*json).clone()).with_tags(extract_tags(blocks))
            }
        };
        if let Some(created_at) = created_at {
            entry = entry.with_created_at(created_at);
        }

        let id = self.store.insert_entry(&entry)?;
        if entry.encrypted {
            self.session.touch()?;
        }
        debug!(encrypted = entry.encrypted, "entry saved");
        Ok(id)
    }

    /// Fetch a stored entry without decrypting it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn read_entry(&self, id: &Uuid) -> Result<Entry> {
        self.store
            .get_entry(id)?
            .ok_or_else(|| DiaryError::NotFound(format!("Entry {}", id)))
    }

    /// The blocks of `entry`, decrypting with the session password if needed.
    ///
    /// # Errors
    ///
    /// - `Locked` for an encrypted entry without a valid session
    /// - `DecryptionFailed` if the payload does not open
    pub fn decrypt_entry(&self, entry: &Entry) -> Result<Vec<Block>> {
        match entry.payload() {
            Some(payload) => {
                let password = self.session_password()?;
                let json = Zeroizing::new(decrypt(&payload, &password)?);
                parse_blocks(&json)
            }
            None => parse_blocks(&entry.data),
        }
    }

    /// Stored entries matching `filter`, newest first.
    pub fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        self.store.list_entries(filter)
    }

    /// Decrypt every entry matching `filter`, one at a time.
    ///
    /// The first failure aborts the whole export.
    pub fn export_entries(&self, filter: &EntryFilter) -> Result<Vec<DecryptedEntry>> {
        let entries = self.store.list_entries(filter)?;
        let mut exported = Vec::with_capacity(entries.len());
        for entry in entries {
            let blocks = self.decrypt_entry(&entry)?;
            exported.push(DecryptedEntry {
                id: entry.id,
                template_id: entry.template_id,
                created_at: entry.created_at,
                encrypted: entry.encrypted,
                tags: if entry.encrypted {
                    extract_tags(&blocks)
                } else {
                    entry.tags
                },
                blocks,
            });
        }
        debug!(count = exported.len(), "entries exported");
        Ok(exported)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::super::test_support::{Fixture, PASSWORD};
    use super::*;

    fn filled(blocks: &[Block]) -> Vec<Block> {
        let mut blocks = blocks.to_vec();
        blocks[0].value = Some(json!("A quiet day"));
        blocks[1].value = Some(json!(["work"]));
        blocks
    }

    #[test]
    fn test_plaintext_save_keeps_tags() {
        let fx = Fixture::new();
        let vault = fx.vault();
        let (template_id, blocks) = fx.template();

        let id = vault.save_entry(template_id, &filled(&blocks), None).unwrap();
        let entry = vault.read_entry(&id).unwrap();
        assert!(!entry.encrypted);
        assert_eq!(entry.tags, vec!["work".to_string()]);
        assert!(entry.data.contains("A quiet day"));
    }

    #[test]
    fn test_full_mode_encrypts_and_hides_tags() {
        let fx = Fixture::new();
        let vault = fx.vault();
        let (template_id, blocks) = fx.template();
        vault.set_password(PASSWORD).unwrap();
        vault.policy().set_mode(EncryptionMode::Full).unwrap();

        let id = vault.save_entry(template_id, &filled(&blocks), None).unwrap();
        let entry = vault.read_entry(&id).unwrap();
        assert!(entry.encrypted);
        assert!(entry.tags.is_empty());
        assert!(!entry.data.contains("quiet"));

        let decrypted = vault.decrypt_entry(&entry).unwrap();
        assert_eq!(decrypted[0].value, Some(json!("A quiet day")));
    }

    #[test]
    fn test_full_mode_save_requires_session() {
        let fx = Fixture::new();
        let vault = fx.vault();
        let (template_id, blocks) = fx.template();
        vault.set_password(PASSWORD).unwrap();
        vault.policy().set_mode(EncryptionMode::Full).unwrap();
        vault.lock().unwrap();

        assert!(matches!(
            vault.save_entry(template_id, &blocks, None),
            Err(DiaryError::Locked)
        ));
        assert!(vault.list_entries(&EntryFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn test_save_slides_session_window() {
        let fx = Fixture::new();
        let vault = fx.vault();
        let (template_id, blocks) = fx.template();
        vault.set_password(PASSWORD).unwrap();
        vault.policy().set_mode(EncryptionMode::Full).unwrap();

        fx.clock.advance(Duration::hours(20));
        vault.save_entry(template_id, &blocks, None).unwrap();
        fx.clock.advance(Duration::hours(20));
        assert!(vault.session().is_valid().unwrap());
    }

    #[test]
    fn test_unknown_template() {
        let fx = Fixture::new();
        assert!(matches!(
            fx.vault().save_entry(Uuid::new_v4(), &[], None),
            Err(DiaryError::NotFound(_))
        ));
    }

    #[test]
    fn test_export_aborts_when_locked() {
        let fx = Fixture::new();
        let vault = fx.vault();
        let (template_id, blocks) = fx.template();
        vault.save_entry(template_id, &filled(&blocks), None).unwrap();
        vault.set_password(PASSWORD).unwrap();
        vault.policy().set_mode(EncryptionMode::Full).unwrap();
        vault.save_entry(template_id, &filled(&blocks), None).unwrap();

        let exported = vault.export_entries(&EntryFilter::new()).unwrap();
        assert_eq!(exported.len(), 2);
        assert!(exported.iter().all(|e| e.tags == vec!["work".to_string()]));

        vault.lock().unwrap();
        assert!(matches!(
            vault.export_entries(&EntryFilter::new()),
            Err(DiaryError::Locked)
        ));
    }

    #[test]
    fn test_backdated_entry() {
        let fx = Fixture::new();
        let vault = fx.vault();
        let (template_id, blocks) = fx.template();
        let when = DateTime::parse_from_rfc3339("2023-05-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let id = vault.save_entry(template_id, &blocks, Some(when)).unwrap();
        assert_eq!(vault.read_entry(&id).unwrap().created_at, when);
    }
}
