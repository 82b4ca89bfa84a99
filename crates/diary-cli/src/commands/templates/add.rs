use diary_core::storage::{NewTemplate, StorageEngine};

use crate::app::AppContext;
use crate::helpers::parse_block_spec;
use crate::ui::{print, receipt};

pub fn handle_add(ctx: &AppContext, name: &str, specs: &[String]) -> anyhow::Result<()> {
    let blocks = specs
        .iter()
        .map(|spec| parse_block_spec(spec))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let storage = ctx.open_storage()?;
    let id = storage.create_template(&NewTemplate::new(name, blocks))?;

    if !ctx.quiet() {
        let ui_ctx = ctx.ui(false);
        let id = id.to_string();
        let count = specs.len().to_string();
        print(
            &ui_ctx,
            &receipt(
                &ui_ctx,
                &format!("Created template '{}'", name),
                &[("id", id.as_str()), ("blocks", count.as_str())],
            ),
        );
    }
    Ok(())
}
