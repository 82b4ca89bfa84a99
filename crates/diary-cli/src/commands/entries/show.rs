use crate::app::{ensure_unlocked, AppContext};
use crate::cli::ShowArgs;
use crate::ui::{format_datetime, header, kv, print};

use super::{resolve_entry_id, template_names, value_text};

pub fn handle_show(ctx: &AppContext, args: &ShowArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    let id = resolve_entry_id(&vault, &args.id)?;
    let entry = vault.read_entry(&id)?;
    if entry.encrypted {
        ensure_unlocked(&vault, false)?;
    }
    let blocks = vault.decrypt_entry(&entry)?;
    let template = template_names(&vault)?
        .remove(&entry.template_id)
        .unwrap_or_else(|| "unknown".to_string());

    if args.json {
        let output = serde_json::json!({
            "id": entry.id.to_string(),
            "template": template,
            "created_at": entry.created_at.to_rfc3339(),
            "encrypted": entry.encrypted,
            "tags": entry.tags,
            "blocks": blocks,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let ui_ctx = ctx.ui(false);
    let pretty = ui_ctx.mode.is_pretty();
    if pretty && !ctx.quiet() {
        print(&ui_ctx, &header(&ui_ctx, "entry", Some(&template)));
    }
    print(&ui_ctx, &kv(&ui_ctx, "Id", &entry.id.to_string()));
    print(
        &ui_ctx,
        &kv(&ui_ctx, "Created", &format_datetime(&entry.created_at, pretty)),
    );
    if pretty {
        println!();
    }
    for block in &blocks {
        let value = block.value.as_ref().map(value_text).unwrap_or_default();
        if value.is_empty() {
            continue;
        }
        if pretty && value.contains('\n') {
            print(&ui_ctx, &kv(&ui_ctx, &block.label, ""));
            println!("{}", value);
        } else {
            print(&ui_ctx, &kv(&ui_ctx, &block.label, &value));
        }
    }
    Ok(())
}
