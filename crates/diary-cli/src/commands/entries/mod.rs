pub mod add;
pub mod export;
pub mod list;
pub mod show;

pub use add::handle_add;
pub use export::handle_export;
pub use list::handle_list;
pub use show::handle_show;

use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use diary_core::blocks::Block;
use diary_core::storage::{EntryFilter, StorageEngine};

use crate::app::CliVault;
use crate::errors::CliError;

/// Template id to name, for labelling entries.
pub(crate) fn template_names(vault: &CliVault) -> anyhow::Result<HashMap<Uuid, String>> {
    Ok(vault
        .store()
        .list_templates()?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect())
}

/// Human-readable rendering of a block value.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// First non-empty text value, used as a one-line summary.
pub(crate) fn blocks_summary(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter_map(|b| b.value.as_ref())
        .filter_map(|v| v.as_str())
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}

/// Resolve a full UUID or a unique prefix of one.
pub(crate) fn resolve_entry_id(vault: &CliVault, id: &str) -> anyhow::Result<Uuid> {
    if let Ok(parsed) = Uuid::parse_str(id) {
        return Ok(parsed);
    }
    let prefix = id.trim().to_ascii_lowercase();
    if prefix.is_empty() {
        return Err(CliError::invalid_input("Entry ID is empty").into());
    }
    let matches: Vec<Uuid> = vault
        .list_entries(&EntryFilter::new())?
        .into_iter()
        .map(|e| e.id)
        .filter(|candidate| candidate.to_string().starts_with(&prefix))
        .collect();
    match matches.as_slice() {
        [only] => Ok(*only),
        [] => Err(CliError::not_found(
            "Entry not found",
            "Hint: Run `diary list --last 7d` to find entry IDs.",
        )
        .into()),
        _ => Err(CliError::invalid_input(format!(
            "Entry ID prefix \"{}\" matches {} entries",
            id,
            matches.len()
        ))
        .into()),
    }
}
