//! Core data types for the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blocks::Block;
use crate::crypto::EncryptedPayload;

/// A user-defined entry layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Unique identifier for this template
    pub id: Uuid,

    /// User-facing name (e.g., "Journal", "Mood")
    pub name: String,

    /// Sort position in template lists
    pub position: i64,

    /// Ordered blocks without values
    pub blocks: Vec<Block>,

    /// When this template was created
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new template.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub blocks: Vec<Block>,
}

impl NewTemplate {
    pub fn new(name: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            name: name.into(),
            blocks,
        }
    }
}

/// A stored entry.
///
/// `data` is the blocks JSON when `encrypted` is false, otherwise an
/// [`EncryptedPayload`] of that JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier for this entry
    pub id: Uuid,

    /// Template the entry was written with
    pub template_id: Uuid,

    /// When the entry was written
    pub created_at: DateTime<Utc>,

    /// Whether `data` is ciphertext
    pub encrypted: bool,

    /// Blocks JSON or base64 payload
    pub data: String,

    /// Plaintext tags (always empty for encrypted entries)
    pub tags: Vec<String>,
}

impl Entry {
    /// The ciphertext, if this entry is encrypted.
    pub fn payload(&self) -> Option<EncryptedPayload> {
        self.encrypted
            .then(|| EncryptedPayload::from(self.data.as_str()))
    }
}

/// Data for inserting a new entry.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub template_id: Uuid,
    pub data: String,
    pub encrypted: bool,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewEntry {
    pub fn plaintext(template_id: Uuid, data: String) -> Self {
        Self {
            template_id,
            data,
            encrypted: false,
            tags: Vec::new(),
            created_at: None,
        }
    }

    pub fn encrypted(template_id: Uuid, payload: EncryptedPayload) -> Self {
        Self {
            template_id,
            data: payload.into_string(),
            encrypted: true,
            tags: Vec::new(),
            created_at: None,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Replacement content for an existing entry, used by re-encryption passes.
#[derive(Debug, Clone)]
pub struct EntryRewrite {
    pub id: Uuid,
    pub data: String,
    pub encrypted: bool,
    pub tags: Vec<String>,
}

/// Filter for querying entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub template_id: Option<Uuid>,
    pub tag: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, id: Uuid) -> Self {
        self.template_id = Some(id);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn since(mut self, date: DateTime<Utc>) -> Self {
        self.since = Some(date);
        self
    }

    pub fn until(mut self, date: DateTime<Utc>) -> Self {
        self.until = Some(date);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
