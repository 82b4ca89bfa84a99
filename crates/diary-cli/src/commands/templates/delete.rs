use std::io::IsTerminal;

use diary_core::storage::StorageEngine;

use crate::app::AppContext;
use crate::helpers::confirm;
use crate::ui::{badge, print, Badge, OutputMode};

use super::require_template;

pub fn handle_delete(ctx: &AppContext, name: &str, yes: bool) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let template = require_template(&storage, name)?;
    let ui_ctx = ctx.ui(false);

    if !yes && std::io::stdin().is_terminal() {
        let confirmed = confirm(&format!("Delete template '{}'?", template.name), false)?;
        if !confirmed {
            if !ctx.quiet() {
                match ui_ctx.mode {
                    OutputMode::Pretty => {
                        print(&ui_ctx, &badge(&ui_ctx, Badge::Info, "Cancelled"));
                    }
                    OutputMode::Plain | OutputMode::Json => {
                        println!("status=cancelled");
                    }
                }
            }
            return Ok(());
        }
    }

    storage.delete_template(&template.id)?;

    if !ctx.quiet() {
        match ui_ctx.mode {
            OutputMode::Pretty => {
                print(
                    &ui_ctx,
                    &badge(
                        &ui_ctx,
                        Badge::Ok,
                        &format!("Deleted template '{}'", template.name),
                    ),
                );
            }
            OutputMode::Plain | OutputMode::Json => {
                println!("status=ok");
                println!("deleted={}", template.name);
            }
        }
    }
    Ok(())
}
