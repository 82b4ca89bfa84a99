//! SQLite storage backend.
//!
//! A plain SQLite file. Confidentiality comes from per-entry encryption done
//! above this layer, so the database itself is not encrypted.

mod row;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::{DiaryError, Result};
use crate::settings::SettingsStore;
use crate::storage::traits::StorageEngine;
use crate::storage::types::{Entry, EntryFilter, EntryRewrite, NewEntry, NewTemplate, Template};

use row::{EntryRow, TemplateRow};

/// Schema version stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = r#"
    CREATE TABLE settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE templates (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE,
        position INTEGER NOT NULL,
        blocks_json TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE entries (
        id TEXT PRIMARY KEY,
        template_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        encrypted INTEGER NOT NULL,
        data TEXT NOT NULL,
        tags_json TEXT,

        FOREIGN KEY(template_id) REFERENCES templates(id)
    );

    CREATE INDEX idx_entries_created_at ON entries(created_at);
    CREATE INDEX idx_entries_template ON entries(template_id);
"#;

/// SQLite-backed storage engine.
pub struct SqliteStorage {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new database file.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the file already exists or cannot be written.
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(DiaryError::Storage(format!(
                "Diary file already exists: {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// Open an existing database file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file does not exist and `Storage` if it is
    /// not a diary database.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DiaryError::NotFound(format!(
                "No diary at {}",
                path.display()
            )));
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version != SCHEMA_VERSION {
            return Err(DiaryError::Storage(format!(
                "Unsupported diary schema version {} (expected {})",
                version, SCHEMA_VERSION
            )));
        }
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// A fresh in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Database file path, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DiaryError::Storage("SQLite connection poisoned".to_string()))
    }

    fn query_template(&self, condition: &str, param: String) -> Result<Option<Template>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} FROM templates WHERE {}",
            TemplateRow::COLUMNS,
            condition
        );
        let row = conn
            .query_row(&sql, [param], TemplateRow::from_row)
            .optional()?;
        row.map(Template::try_from).transpose()
    }
}

fn tags_to_json(tags: &[String]) -> Result<Option<String>> {
    if tags.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(tags)
        .map(Some)
        .map_err(|e| DiaryError::Storage(format!("Failed to serialize tags: {}", e)))
}

impl SettingsStore for SqliteStorage {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock_conn()?;
        let value = conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;
        Ok(())
    }
}

impl StorageEngine for SqliteStorage {
    fn create_template(&self, template: &NewTemplate) -> Result<Uuid> {
        let name = template.name.trim();
        if name.is_empty() {
            return Err(DiaryError::Validation(
                "Template name cannot be empty".to_string(),
            ));
        }
        let blocks_json = serde_json::to_string(&template.blocks)?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let exists: Option<String> = tx
            .query_row(
                "SELECT id FROM templates WHERE name = ? COLLATE NOCASE",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(DiaryError::Validation(format!(
                "Template \"{}\" already exists",
                name
            )));
        }

        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM templates",
            [],
            |row| row.get(0),
        )?;
        let id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO templates (id, name, position, blocks_json, created_at) VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                name,
                position,
                blocks_json,
                Utc::now().to_rfc3339(),
            ),
        )?;
        tx.commit()?;

        Ok(id)
    }

    fn get_template(&self, name: &str) -> Result<Option<Template>> {
        self.query_template("name = ? COLLATE NOCASE", name.trim().to_string())
    }

    fn get_template_by_id(&self, id: &Uuid) -> Result<Option<Template>> {
        self.query_template("id = ?", id.to_string())
    }

    fn list_templates(&self) -> Result<Vec<Template>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} FROM templates ORDER BY position, name",
            TemplateRow::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], TemplateRow::from_row)?;

        let mut templates = Vec::new();
        for row in rows {
            templates.push(row?.try_into()?);
        }
        Ok(templates)
    }

    fn delete_template(&self, id: &Uuid) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let in_use: i64 = tx.query_row(
            "SELECT COUNT(*) FROM entries WHERE template_id = ?",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Err(DiaryError::Validation(format!(
                "Template is used by {} entr{}",
                in_use,
                if in_use == 1 { "y" } else { "ies" }
            )));
        }

        let deleted = tx.execute("DELETE FROM templates WHERE id = ?", [id.to_string()])?;
        if deleted == 0 {
            return Err(DiaryError::NotFound(format!("Template {}", id)));
        }
        tx.commit()?;
        Ok(())
    }

    fn insert_entry(&self, entry: &NewEntry) -> Result<Uuid> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let exists: Option<String> = tx
            .query_row(
                "SELECT id FROM templates WHERE id = ?",
                [entry.template_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(DiaryError::Validation(
                "Template does not exist".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let created_at = entry.created_at.unwrap_or_else(Utc::now);
        tx.execute(
            r#"
            INSERT INTO entries (id, template_id, created_at, encrypted, data, tags_json)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            (
                id.to_string(),
                entry.template_id.to_string(),
                created_at.to_rfc3339(),
                entry.encrypted,
                &entry.data,
                tags_to_json(&entry.tags)?,
            ),
        )?;
        tx.commit()?;

        Ok(id)
    }

    fn get_entry(&self, id: &Uuid) -> Result<Option<Entry>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {} FROM entries e WHERE e.id = ?", EntryRow::COLUMNS);
        let row = conn
            .query_row(&sql, [id.to_string()], EntryRow::from_row)
            .optional()?;
        row.map(Entry::try_from).transpose()
    }

    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let conn = self.lock_conn()?;

        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(template_id) = filter.template_id {
            conditions.push("e.template_id = ?");
            params.push(Box::new(template_id.to_string()));
        }

        if let Some(ref tag) = filter.tag {
            conditions.push(
                "e.tags_json IS NOT NULL AND EXISTS (SELECT 1 FROM json_each(e.tags_json) WHERE value = ?)",
            );
            params.push(Box::new(tag.trim().to_string()));
        }

        if let Some(since) = filter.since {
            conditions.push("e.created_at >= ?");
            params.push(Box::new(since.to_rfc3339()));
        }

        if let Some(until) = filter.until {
            conditions.push("e.created_at <= ?");
            params.push(Box::new(until.to_rfc3339()));
        }

        let mut query = format!("SELECT {} FROM entries e", EntryRow::COLUMNS);
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY e.created_at DESC, e.rowid DESC");

        if let Some(limit) = filter.limit {
            query.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params.iter()),
            EntryRow::from_row,
        )?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.try_into()?);
        }
        Ok(entries)
    }

    fn rewrite_entries(
        &self,
        rewrites: &[EntryRewrite],
        settings: &[(&str, &str)],
    ) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        for rewrite in rewrites {
            let updated = tx.execute(
                "UPDATE entries SET data = ?, encrypted = ?, tags_json = ? WHERE id = ?",
                (
                    &rewrite.data,
                    rewrite.encrypted,
                    tags_to_json(&rewrite.tags)?,
                    rewrite.id.to_string(),
                ),
            )?;
            if updated == 0 {
                return Err(DiaryError::NotFound(format!("Entry {}", rewrite.id)));
            }
        }
        for (key, value) in settings {
            tx.execute(
                "INSERT INTO settings (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                (key, value),
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Block, BlockType};
    use crate::settings::keys;

    fn storage_with_template() -> (SqliteStorage, Uuid) {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let id = storage
            .create_template(&NewTemplate::new(
                "Journal",
                vec![Block::new(BlockType::Textarea, "Notes")],
            ))
            .unwrap();
        (storage, id)
    }

    #[test]
    fn test_settings_round_trip() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.get_setting(keys::ENCRYPTION_MODE).unwrap(), None);
        storage.set_setting(keys::ENCRYPTION_MODE, "full").unwrap();
        storage.set_setting(keys::ENCRYPTION_MODE, "none").unwrap();
        assert_eq!(
            storage.get_setting(keys::ENCRYPTION_MODE).unwrap().as_deref(),
            Some("none")
        );
    }

    #[test]
    fn test_template_names_unique_case_insensitive() {
        let (storage, id) = storage_with_template();
        let err = storage
            .create_template(&NewTemplate::new("journal", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, DiaryError::Validation(_)));

        let found = storage.get_template("JOURNAL").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.blocks.len(), 1);
    }

    #[test]
    fn test_template_positions_increase() {
        let (storage, _) = storage_with_template();
        storage
            .create_template(&NewTemplate::new("Mood", Vec::new()))
            .unwrap();
        let names: Vec<_> = storage
            .list_templates()
            .unwrap()
            .into_iter()
            .map(|t| (t.name, t.position))
            .collect();
        assert_eq!(names, vec![("Journal".into(), 0), ("Mood".into(), 1)]);
    }

    #[test]
    fn test_insert_requires_template() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let err = storage
            .insert_entry(&NewEntry::plaintext(Uuid::new_v4(), "[]".into()))
            .unwrap_err();
        assert!(matches!(err, DiaryError::Validation(_)));
    }

    #[test]
    fn test_list_filters_by_tag_and_limit() {
        let (storage, template_id) = storage_with_template();
        storage
            .insert_entry(
                &NewEntry::plaintext(template_id, "[]".into()).with_tags(vec!["work".into()]),
            )
            .unwrap();
        storage
            .insert_entry(&NewEntry::plaintext(template_id, "[]".into()))
            .unwrap();

        let tagged = storage
            .list_entries(&EntryFilter::new().tag("work"))
            .unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].tags, vec!["work".to_string()]);

        let limited = storage.list_entries(&EntryFilter::new().limit(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_delete_template_in_use_rejected() {
        let (storage, template_id) = storage_with_template();
        storage
            .insert_entry(&NewEntry::plaintext(template_id, "[]".into()))
            .unwrap();
        assert!(matches!(
            storage.delete_template(&template_id),
            Err(DiaryError::Validation(_))
        ));
        assert!(matches!(
            storage.delete_template(&Uuid::new_v4()),
            Err(DiaryError::NotFound(_))
        ));
    }

    #[test]
    fn test_rewrite_is_atomic() {
        let (storage, template_id) = storage_with_template();
        let id = storage
            .insert_entry(&NewEntry::plaintext(template_id, "[]".into()))
            .unwrap();

        let rewrites = vec![
            EntryRewrite {
                id,
                data: "changed".into(),
                encrypted: true,
                tags: Vec::new(),
            },
            EntryRewrite {
                id: Uuid::new_v4(),
                data: "missing".into(),
                encrypted: true,
                tags: Vec::new(),
            },
        ];
        assert!(storage
            .rewrite_entries(&rewrites, &[(keys::ENCRYPTION_MODE, "full")])
            .is_err());

        let entry = storage.get_entry(&id).unwrap().unwrap();
        assert_eq!(entry.data, "[]");
        assert!(!entry.encrypted);
        assert_eq!(storage.get_setting(keys::ENCRYPTION_MODE).unwrap(), None);
    }

    #[test]
    fn test_create_and_reopen_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("diary.db");
        {
            let storage = SqliteStorage::create(&path).unwrap();
            storage.set_setting(keys::SETUP_COMPLETED, "true").unwrap();
        }
        assert!(SqliteStorage::create(&path).is_err());

        let reopened = SqliteStorage::open(&path).unwrap();
        assert!(reopened.get_flag(keys::SETUP_COMPLETED).unwrap());
        assert_eq!(reopened.path(), Some(path.as_path()));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SqliteStorage::open(&dir.path().join("absent.db")),
            Err(DiaryError::NotFound(_))
        ));
    }

    fn entry_count<S: StorageEngine>(storage: S) -> usize {
        storage.list_entries(&EntryFilter::new()).unwrap().len()
    }

    #[test]
    fn test_borrowed_storage_is_a_storage_engine() {
        let (storage, template_id) = storage_with_template();
        let borrowed = &storage;
        borrowed
            .insert_entry(&NewEntry::plaintext(template_id, "[]".into()))
            .unwrap();

        assert_eq!(entry_count(&storage), 1);
        assert!(borrowed.get_template("journal").unwrap().is_some());
    }
}
