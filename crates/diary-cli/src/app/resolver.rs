//! Path resolution for config and diary files.

use std::path::{Path, PathBuf};

use crate::config::default_config_path;

/// Resolve the config file path, checking `DIARY_CONFIG` first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("DIARY_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Message shown when no diary exists where one is expected.
pub fn missing_diary_message(path: &Path) -> String {
    format!(
        "No diary found at {}\n\nRun:\n  diary init\n\nOr specify a diary path:\n  DIARY_PATH=/path/to/diary.db diary init",
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_diary_message_names_path() {
        let message = missing_diary_message(Path::new("/data/diary.db"));
        assert!(message.starts_with("No diary found at /data/diary.db"));
        assert!(message.contains("diary init"));
    }
}
