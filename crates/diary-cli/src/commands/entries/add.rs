use std::io::IsTerminal;

use diary_core::blocks::{fill_blocks, parse_blocks};

use crate::app::{ensure_unlocked, AppContext};
use crate::cli::AddArgs;
use crate::commands::templates::require_template;
use crate::errors::CliError;
use crate::helpers::{parse_datetime, parse_value_pair, prompt_block_values};
use crate::ui::{print, receipt, short_id};

pub fn handle_add(ctx: &AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    let template = require_template(vault.store(), &args.template)?;
    let interactive = std::io::stdin().is_terminal() && !args.no_input;

    // Unlock before asking for content so a wrong password wastes nothing.
    ensure_unlocked(&vault, args.no_input)?;

    let blocks = if let Some(data) = args.data.as_ref() {
        parse_blocks(data)?
    } else {
        let values = if !args.values.is_empty() {
            args.values
                .iter()
                .map(|v| parse_value_pair(v))
                .collect::<anyhow::Result<Vec<_>>>()?
        } else if interactive {
            prompt_block_values(&template.blocks)?
        } else {
            return Err(CliError::invalid_input(
                "No values given. Use --value LABEL=VALUE or --data JSON.",
            )
            .into());
        };
        fill_blocks(&template.blocks, &values)?
    };

    let created_at = args.date.as_deref().map(parse_datetime).transpose()?;
    let id = vault.save_entry(template.id, &blocks, created_at)?;

    if !ctx.quiet() {
        let ui_ctx = ctx.ui(false);
        let mode = vault.mode()?;
        let id_text = if ui_ctx.mode.is_pretty() {
            short_id(&id)
        } else {
            id.to_string()
        };
        print(
            &ui_ctx,
            &receipt(
                &ui_ctx,
                "Entry saved",
                &[
                    ("id", id_text.as_str()),
                    ("template", template.name.as_str()),
                    ("encryption", mode.as_str()),
                ],
            ),
        );
    }
    Ok(())
}
