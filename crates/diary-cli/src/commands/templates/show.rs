use diary_core::blocks::{Block, BlockType};

use crate::app::AppContext;
use crate::ui::{header, kv, print, simple_table, Column};

use super::require_template;

fn block_details(block: &Block) -> String {
    match block.kind {
        BlockType::Slider => format!(
            "{}-{} step {}",
            block.min.unwrap_or(0.0),
            block.max.unwrap_or(10.0),
            block.step.unwrap_or(1.0)
        ),
        BlockType::Multiselect => {
            let choices = block.choices();
            if choices.is_empty() {
                "any tag".to_string()
            } else {
                choices.join(", ")
            }
        }
        _ => String::new(),
    }
}

pub fn handle_show(ctx: &AppContext, name: &str, json: bool) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let template = require_template(&storage, name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&template)?);
        return Ok(());
    }

    let ui_ctx = ctx.ui(false);
    if ui_ctx.mode.is_pretty() && !ctx.quiet() {
        print(&ui_ctx, &header(&ui_ctx, "template", Some(&template.name)));
    }
    print(&ui_ctx, &kv(&ui_ctx, "Id", &template.id.to_string()));
    let rows: Vec<Vec<String>> = template
        .blocks
        .iter()
        .map(|b| vec![b.label.clone(), b.kind.as_str().to_string(), block_details(b)])
        .collect();
    print(
        &ui_ctx,
        &simple_table(
            &ui_ctx,
            &[Column::new("LABEL"), Column::new("TYPE"), Column::new("OPTIONS")],
            &rows,
        ),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_details() {
        let slider = Block::new(BlockType::Slider, "Mood").with_range(1.0, 5.0, 1.0);
        assert_eq!(block_details(&slider), "1-5 step 1");
        let open = Block::new(BlockType::Multiselect, "Tags");
        assert_eq!(block_details(&open), "any tag");
        let fixed = Block::new(BlockType::Multiselect, "Tags")
            .with_choices(vec!["work".into(), "sport".into()]);
        assert_eq!(block_details(&fixed), "work, sport");
    }
}
