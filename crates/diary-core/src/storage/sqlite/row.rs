//! Row types for database queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::blocks::Block;
use crate::error::{DiaryError, Result};
use crate::storage::types::{Entry, Template};

/// Raw row data from the entries table, before parsing into domain types.
#[derive(Debug)]
pub struct EntryRow {
    pub id: String,
    pub template_id: String,
    pub created_at: String,
    pub encrypted: bool,
    pub data: String,
    pub tags_json: Option<String>,
}

impl EntryRow {
    pub const COLUMNS: &'static str = "e.id, e.template_id, e.created_at, e.encrypted, e.data, e.tags_json";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            template_id: row.get(1)?,
            created_at: row.get(2)?,
            encrypted: row.get(3)?,
            data: row.get(4)?,
            tags_json: row.get(5)?,
        })
    }
}

impl TryFrom<EntryRow> for Entry {
    type Error = DiaryError;

    fn try_from(row: EntryRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| DiaryError::Storage(format!("Invalid entry UUID: {}", e)))?;
        let template_id = Uuid::parse_str(&row.template_id)
            .map_err(|e| DiaryError::Storage(format!("Invalid template UUID: {}", e)))?;
        let created_at = parse_timestamp(&row.created_at)?;
        let tags: Vec<String> = match row.tags_json {
            Some(ref value) => serde_json::from_str(value)
                .map_err(|e| DiaryError::Storage(format!("Invalid tags JSON: {}", e)))?,
            None => Vec::new(),
        };

        Ok(Entry {
            id,
            template_id,
            created_at,
            encrypted: row.encrypted,
            data: row.data,
            tags,
        })
    }
}

/// Raw row data from the templates table.
#[derive(Debug)]
pub struct TemplateRow {
    pub id: String,
    pub name: String,
    pub position: i64,
    pub blocks_json: String,
    pub created_at: String,
}

impl TemplateRow {
    pub const COLUMNS: &'static str = "id, name, position, blocks_json, created_at";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            position: row.get(2)?,
            blocks_json: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl TryFrom<TemplateRow> for Template {
    type Error = DiaryError;

    fn try_from(row: TemplateRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| DiaryError::Storage(format!("Invalid template UUID: {}", e)))?;
        let blocks: Vec<Block> = serde_json::from_str(&row.blocks_json)
            .map_err(|e| DiaryError::Storage(format!("Invalid template blocks: {}", e)))?;

        Ok(Template {
            id,
            name: row.name,
            position: row.position,
            blocks,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| DiaryError::Storage(format!("Invalid timestamp: {}", e)))?
        .with_timezone(&Utc))
}
