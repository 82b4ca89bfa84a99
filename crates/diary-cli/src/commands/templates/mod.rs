pub mod add;
pub mod delete;
pub mod list;
pub mod show;

pub use add::handle_add;
pub use delete::handle_delete;
pub use list::handle_list;
pub use show::handle_show;

use diary_core::storage::{SqliteStorage, StorageEngine, Template};

use crate::errors::CliError;

/// Look up a template by name, exiting with a not-found hint if it is missing.
pub(crate) fn require_template(storage: &SqliteStorage, name: &str) -> anyhow::Result<Template> {
    storage.get_template(name)?.ok_or_else(|| {
        CliError::not_found(
            format!("Template \"{}\" not found", name),
            "Hint: Run `diary template list` to see available templates.",
        )
        .into()
    })
}
