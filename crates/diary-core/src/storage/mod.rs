//! Persistent storage for settings, templates and entries.

pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteStorage;
pub use traits::StorageEngine;
pub use types::{Entry, EntryFilter, EntryRewrite, NewEntry, NewTemplate, Template};
