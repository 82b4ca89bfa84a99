//! Password entry with retry logic.

use std::io::IsTerminal;

use diary_core::{DiaryError, FreshAuth};
use zeroize::Zeroizing;

use crate::constants::MAX_PASSWORD_ATTEMPTS;
use crate::errors::CliError;
use crate::helpers::{env_secret, prompt_new_password, prompt_password};

use super::context::CliVault;

fn is_interactive(no_input: bool) -> bool {
    std::io::stdin().is_terminal() && !no_input
}

/// Scripted attempts for tests that cannot drive a TTY.
fn test_attempts(interactive: bool) -> Option<Vec<Zeroizing<String>>> {
    if interactive || !cfg!(feature = "test-support") {
        return None;
    }
    std::env::var("DIARY_TEST_PASSWORD_ATTEMPTS").ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Zeroizing::new(item.to_string()))
            .collect()
    })
}

/// Ask for the password until `attempt` accepts it.
///
/// `DIARY_PASSWORD` gets a single try; a terminal gets three.
fn with_password_retry<T>(
    prompt: &str,
    no_input: bool,
    mut attempt: impl FnMut(&str) -> diary_core::Result<T>,
) -> anyhow::Result<T> {
    if let Some(password) = env_secret("DIARY_PASSWORD") {
        return Ok(attempt(&password)?);
    }

    let interactive = is_interactive(no_input);
    let scripted = test_attempts(interactive);
    let max_attempts = if interactive || scripted.is_some() {
        MAX_PASSWORD_ATTEMPTS
    } else {
        1
    };
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let password = match scripted.as_ref() {
            Some(values) => values
                .get((attempts - 1) as usize)
                .cloned()
                .ok_or_else(|| CliError::auth_failed("No password attempts remaining."))?,
            None => prompt_password(prompt, interactive)?,
        };
        match attempt(&password) {
            Ok(value) => return Ok(value),
            Err(DiaryError::IncorrectPassword) => {
                let remaining = max_attempts.saturating_sub(attempts);
                if remaining == 0 {
                    return Err(CliError::auth_failed_with_hint(
                        "Too many failed password attempts.",
                        "Hint: A forgotten password cannot be recovered; encrypted entries stay unreadable.",
                    )
                    .into());
                }
                eprintln!(
                    "Incorrect password. {} attempt{} remaining.",
                    remaining,
                    if remaining == 1 { "" } else { "s" }
                );
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Make sure encrypted content is readable, prompting if that is possible.
///
/// # Errors
///
/// `Locked` when the diary needs unlocking and no password can be obtained.
pub fn ensure_unlocked(vault: &CliVault, no_input: bool) -> anyhow::Result<bool> {
    if !vault.needs_unlock()? {
        return Ok(false);
    }
    let scripted = test_attempts(is_interactive(no_input)).is_some();
    if env_secret("DIARY_PASSWORD").is_none() && !is_interactive(no_input) && !scripted {
        return Err(CliError::locked("The diary is locked.").into());
    }
    unlock_with_password(vault, no_input)?;
    Ok(true)
}

/// Check the password and open a session.
pub fn unlock_with_password(vault: &CliVault, no_input: bool) -> anyhow::Result<()> {
    with_password_retry("Password", no_input, |password| vault.unlock(password))
}

/// Re-enter the password even if a session is open.
pub fn fresh_auth(vault: &CliVault, no_input: bool) -> anyhow::Result<FreshAuth> {
    with_password_retry("Current password", no_input, |password| {
        vault.reauthenticate(password)
    })
}

/// The current password, checked against the stored token.
pub fn verified_password(vault: &CliVault, no_input: bool) -> anyhow::Result<Zeroizing<String>> {
    with_password_retry("Password", no_input, |password| {
        if vault.check_password(password)? {
            Ok(Zeroizing::new(password.to_string()))
        } else {
            Err(DiaryError::IncorrectPassword)
        }
    })
}

/// A new password from `env_var` or a confirmed prompt.
pub fn new_password(env_var: &str, no_input: bool) -> anyhow::Result<Zeroizing<String>> {
    prompt_new_password(env_var, is_interactive(no_input))
}
