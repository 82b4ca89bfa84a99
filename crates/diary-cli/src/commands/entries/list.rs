use chrono::Utc;

use diary_core::blocks::parse_blocks;
use diary_core::storage::{Entry, EntryFilter};

use crate::app::AppContext;
use crate::cli::ListArgs;
use crate::commands::templates::require_template;
use crate::helpers::{parse_datetime, parse_duration};
use crate::ui::{format_datetime, header, print, short_id, simple_table, single_line, truncate, Column};

use super::{blocks_summary, template_names};

const DEFAULT_LIST_LIMIT: usize = 20;
const SUMMARY_MAX: usize = 60;

/// Listing never decrypts: encrypted entries only show their metadata.
fn entry_summary(entry: &Entry) -> String {
    if entry.encrypted {
        return "(encrypted)".to_string();
    }
    parse_blocks(&entry.data)
        .map(|blocks| single_line(&blocks_summary(&blocks)))
        .unwrap_or_default()
}

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;

    let mut filter = EntryFilter::new();
    if let Some(name) = args.template.as_ref() {
        filter = filter.template(require_template(vault.store(), name)?.id);
    }
    if let Some(tag) = args.tag.as_ref() {
        filter = filter.tag(tag.clone());
    }
    if let Some(last) = args.last.as_ref() {
        filter = filter.since(Utc::now() - parse_duration(last)?);
    }
    if let Some(since) = args.since.as_ref() {
        filter = filter.since(parse_datetime(since)?);
    }
    if let Some(until) = args.until.as_ref() {
        filter = filter.until(parse_datetime(until)?);
    }
    if let Some(limit) = args.limit {
        filter = filter.limit(limit);
    } else if args.last.is_none() && args.since.is_none() && args.until.is_none() {
        filter = filter.limit(DEFAULT_LIST_LIMIT);
    }

    let entries = vault.list_entries(&filter)?;
    let names = template_names(&vault)?;
    let template_of = |entry: &Entry| {
        names
            .get(&entry.template_id)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string())
    };

    if args.json {
        let output: Vec<_> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "id": e.id.to_string(),
                    "template": template_of(e),
                    "created_at": e.created_at.to_rfc3339(),
                    "encrypted": e.encrypted,
                    "tags": e.tags,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }
    if entries.is_empty() {
        if !ctx.quiet() {
            println!("No entries found.");
        }
        return Ok(());
    }

    let ui_ctx = ctx.ui(false);
    let pretty = ui_ctx.mode.is_pretty();
    if pretty && !ctx.quiet() {
        print(&ui_ctx, &header(&ui_ctx, "list", None));
    }
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                if pretty { short_id(&e.id) } else { e.id.to_string() },
                format_datetime(&e.created_at, pretty),
                template_of(e),
                e.tags.join(","),
                truncate(&entry_summary(e), SUMMARY_MAX),
            ]
        })
        .collect();
    print(
        &ui_ctx,
        &simple_table(
            &ui_ctx,
            &[
                Column::new("ID"),
                Column::new("CREATED"),
                Column::new("TEMPLATE"),
                Column::new("TAGS"),
                Column::new("SUMMARY"),
            ],
            &rows,
        ),
    );
    Ok(())
}
