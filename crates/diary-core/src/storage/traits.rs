//! Storage engine trait definition.
//!
//! The `StorageEngine` trait is the persistent store behind a diary:
//! settings, templates and entries. Backends only move bytes; they never see
//! passwords and never decide whether content is encrypted.

use uuid::Uuid;

use super::types::{Entry, EntryFilter, EntryRewrite, NewEntry, NewTemplate, Template};
use crate::error::Result;
use crate::settings::SettingsStore;

/// Storage engine interface for diary data.
///
/// All implementations must ensure:
/// - Settings are durable key/value pairs
/// - `rewrite_entries` is all-or-nothing
/// - UUIDs are used for all identifiers
pub trait StorageEngine: SettingsStore {
    /// Create a template and return its id.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the name is empty or already taken.
    fn create_template(&self, template: &NewTemplate) -> Result<Uuid>;

    /// Look up a template by name (case-insensitive).
    fn get_template(&self, name: &str) -> Result<Option<Template>>;

    fn get_template_by_id(&self, id: &Uuid) -> Result<Option<Template>>;

    /// All templates ordered by position.
    fn list_templates(&self) -> Result<Vec<Template>>;

    /// Delete a template.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `Validation` if entries still
    /// reference the template.
    fn delete_template(&self, id: &Uuid) -> Result<()>;

    /// Insert a new entry and return its id.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the template does not exist.
    fn insert_entry(&self, entry: &NewEntry) -> Result<Uuid>;

    fn get_entry(&self, id: &Uuid) -> Result<Option<Entry>>;

    /// Entries matching `filter`, newest first.
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>>;

    /// Replace the content of many entries and write settings in one transaction.
    ///
    /// Used when every payload changes at once (password change, mode change).
    fn rewrite_entries(&self, rewrites: &[EntryRewrite], settings: &[(&str, &str)])
        -> Result<()>;
}

impl<T: StorageEngine + ?Sized> StorageEngine for &T {
    fn create_template(&self, template: &NewTemplate) -> Result<Uuid> {
        (**self).create_template(template)
    }

    fn get_template(&self, name: &str) -> Result<Option<Template>> {
        (**self).get_template(name)
    }

    fn get_template_by_id(&self, id: &Uuid) -> Result<Option<Template>> {
        (**self).get_template_by_id(id)
    }

    fn list_templates(&self) -> Result<Vec<Template>> {
        (**self).list_templates()
    }

    fn delete_template(&self, id: &Uuid) -> Result<()> {
        (**self).delete_template(id)
    }

    fn insert_entry(&self, entry: &NewEntry) -> Result<Uuid> {
        (**self).insert_entry(entry)
    }

    fn get_entry(&self, id: &Uuid) -> Result<Option<Entry>> {
        (**self).get_entry(id)
    }

    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        (**self).list_entries(filter)
    }

    fn rewrite_entries(
        &self,
        rewrites: &[EntryRewrite],
        settings: &[(&str, &str)],
    ) -> Result<()> {
        (**self).rewrite_entries(rewrites, settings)
    }
}
