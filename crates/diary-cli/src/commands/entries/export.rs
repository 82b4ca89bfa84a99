use std::path::Path;

use diary_core::fs::write_atomic;
use diary_core::storage::EntryFilter;
use diary_core::DecryptedEntry;

use crate::app::{ensure_unlocked, AppContext};
use crate::cli::{ExportArgs, ExportFormat};
use crate::commands::templates::require_template;
use crate::helpers::parse_datetime;
use crate::ui::{print, receipt, Spinner};

use super::template_names;

fn render(
    entries: &[DecryptedEntry],
    names: &std::collections::HashMap<uuid::Uuid, String>,
    format: ExportFormat,
) -> anyhow::Result<String> {
    let values: Vec<serde_json::Value> = entries
        .iter()
        .map(|e| -> anyhow::Result<serde_json::Value> {
            let mut value = serde_json::to_value(e)?;
            if let Some(object) = value.as_object_mut() {
                let name = names.get(&e.template_id).cloned().unwrap_or_default();
                object.insert("template".to_string(), serde_json::Value::String(name));
            }
            Ok(value)
        })
        .collect::<anyhow::Result<_>>()?;

    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&values)? + "\n"),
        ExportFormat::Jsonl => {
            let mut out = String::new();
            for value in &values {
                out.push_str(&serde_json::to_string(value)?);
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// Export every matching entry in the clear.
///
/// Encrypted entries need a valid session; the first entry that fails to
/// decrypt aborts the export before anything is written.
pub fn handle_export(ctx: &AppContext, args: &ExportArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;

    let mut filter = EntryFilter::new();
    if let Some(name) = args.template.as_ref() {
        filter = filter.template(require_template(vault.store(), name)?.id);
    }
    if let Some(since) = args.since.as_ref() {
        filter = filter.since(parse_datetime(since)?);
    }

    if vault.list_entries(&filter)?.iter().any(|e| e.encrypted) {
        ensure_unlocked(&vault, false)?;
    }

    let ui_ctx = ctx.ui(args.output.is_none());
    let spinner = Spinner::new(&ui_ctx, "Decrypting entries");
    let entries = vault.export_entries(&filter)?;
    spinner.clear();
    let contents = render(&entries, &template_names(&vault)?, args.format)?;

    match args.output.as_ref() {
        None => print!("{}", contents),
        Some(path) => {
            write_atomic(Path::new(path), contents.as_bytes())
                .map_err(|e| anyhow::anyhow!("Failed to write export {}: {}", path, e))?;
            if !ctx.quiet() {
                let count = entries.len().to_string();
                print(
                    &ui_ctx,
                    &receipt(
                        &ui_ctx,
                        "Export written",
                        &[("path", path.as_str()), ("entries", count.as_str())],
                    ),
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample() -> (Vec<DecryptedEntry>, std::collections::HashMap<Uuid, String>) {
        let template_id = Uuid::new_v4();
        let entry = DecryptedEntry {
            id: Uuid::new_v4(),
            template_id,
            created_at: Utc::now(),
            encrypted: true,
            tags: vec!["sport".to_string()],
            blocks: Vec::new(),
        };
        let names = [(template_id, "Journal".to_string())].into_iter().collect();
        (vec![entry.clone(), entry], names)
    }

    #[test]
    fn test_jsonl_has_one_line_per_entry() {
        let (entries, names) = sample();
        let out = render(&entries, &names, ExportFormat::Jsonl).unwrap();
        assert_eq!(out.lines().count(), 2);
        let first: serde_json::Value = serde_json::from_str(out.lines().next().unwrap()).unwrap();
        assert_eq!(first["template"], "Journal");
        assert_eq!(first["tags"][0], "sport");
    }

    #[test]
    fn test_json_is_an_array() {
        let (entries, names) = sample();
        let out = render(&entries, &names, ExportFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }
}
