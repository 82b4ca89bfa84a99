use diary_core::storage::StorageEngine;

use crate::app::AppContext;
use crate::ui::{format_datetime, header, print, simple_table, Column};

pub fn handle_list(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let templates = storage.list_templates()?;

    if json {
        let output: Vec<_> = templates
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id.to_string(),
                    "name": t.name,
                    "position": t.position,
                    "blocks": t.blocks.len(),
                    "created_at": t.created_at.to_rfc3339(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }
    if templates.is_empty() {
        if !ctx.quiet() {
            println!("No templates found.");
        }
        return Ok(());
    }

    let ui_ctx = ctx.ui(false);
    if ui_ctx.mode.is_pretty() && !ctx.quiet() {
        print(&ui_ctx, &header(&ui_ctx, "templates", None));
    }
    let rows: Vec<Vec<String>> = templates
        .iter()
        .map(|t| {
            vec![
                t.name.clone(),
                t.blocks.len().to_string(),
                format_datetime(&t.created_at, ui_ctx.mode.is_pretty()),
            ]
        })
        .collect();
    print(
        &ui_ctx,
        &simple_table(
            &ui_ctx,
            &[Column::new("NAME"), Column::new("BLOCKS"), Column::new("CREATED")],
            &rows,
        ),
    );
    Ok(())
}
