//! Interactive prompts for passwords and entry fields.

use dialoguer::{Confirm, Input, MultiSelect, Password};
use diary_core::blocks::{Block, BlockType};
use diary_core::crypto::{password_issues, validate_password};
use zeroize::Zeroizing;

use crate::errors::CliError;

/// Read a non-empty secret from the environment.
pub fn env_secret(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(Zeroizing::new)
}

/// Prompt for the current password, or read it from `DIARY_PASSWORD`.
pub fn prompt_password(prompt: &str, interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = env_secret("DIARY_PASSWORD") {
        return Ok(value);
    }
    if !interactive {
        return Err(CliError::auth_failed_with_hint(
            "No password provided and no TTY available.",
            "Hint: Set DIARY_PASSWORD or run in a terminal.",
        )
        .into());
    }
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Prompt for a new password with confirmation, or read it from `env_var`.
///
/// Strength rules apply either way; an interactive prompt repeats until
/// they pass.
pub fn prompt_new_password(env_var: &str, interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = env_secret(env_var) {
        validate_password(&value)?;
        return Ok(value);
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No password provided and no TTY available. Set {}.",
            env_var
        ))
        .into());
    }
    loop {
        let password = Zeroizing::new(
            Password::new()
                .with_prompt("New password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()
                .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?,
        );
        let issues = password_issues(&password);
        if issues.is_empty() {
            return Ok(password);
        }
        let missing = issues
            .iter()
            .map(|issue| issue.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        eprintln!("Password must contain {}.", missing);
    }
}

pub fn confirm(prompt: &str, default: bool) -> anyhow::Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read answer: {}", e))
}

/// Ask for a value for every block, as LABEL/raw-text pairs for `fill_blocks`.
///
/// Empty answers are skipped so the block stays without a value.
pub fn prompt_block_values(blocks: &[Block]) -> anyhow::Result<Vec<(String, String)>> {
    let mut values = Vec::new();
    for block in blocks {
        let raw = match block.kind {
            BlockType::Checkbox => {
                let checked = confirm(&block.label, false)?;
                Some(checked.to_string())
            }
            BlockType::Multiselect if !block.choices().is_empty() => {
                let choices = block.choices();
                let picked = MultiSelect::new()
                    .with_prompt(&block.label)
                    .items(&choices)
                    .interact()
                    .map_err(|e| anyhow::anyhow!("Failed to read selection: {}", e))?;
                let selected: Vec<&str> = picked.into_iter().map(|i| choices[i]).collect();
                (!selected.is_empty()).then(|| selected.join(","))
            }
            _ => {
                let prompt = match (block.kind, block.min, block.max) {
                    (BlockType::Slider, Some(min), Some(max)) => {
                        format!("{} ({}-{})", block.label, min, max)
                    }
                    (BlockType::Date, _, _) => format!("{} (YYYY-MM-DD)", block.label),
                    _ => block.label.clone(),
                };
                let answer: String = Input::new()
                    .with_prompt(prompt)
                    .allow_empty(true)
                    .interact_text()
                    .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", block.label, e))?;
                (!answer.trim().is_empty()).then_some(answer)
            }
        };
        if let Some(raw) = raw {
            values.push((block.label.clone(), raw));
        }
    }
    Ok(values)
}
