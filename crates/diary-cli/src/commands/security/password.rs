use diary_core::DiaryError;

use crate::app::{fresh_auth, new_password, AppContext};
use crate::ui::{badge, print, Badge, OutputMode, Spinner};

fn report(ctx: &AppContext, message: &str) {
    if ctx.quiet() {
        return;
    }
    let ui_ctx = ctx.ui(false);
    match ui_ctx.mode {
        OutputMode::Pretty => print(&ui_ctx, &badge(&ui_ctx, Badge::Ok, message)),
        OutputMode::Plain | OutputMode::Json => println!("status=ok"),
    }
}

/// First password for a diary that has none yet.
pub fn handle_password_set(ctx: &AppContext, no_input: bool) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    if vault.has_password()? {
        return Err(DiaryError::PasswordAlreadySet.into());
    }
    let password = new_password("DIARY_PASSWORD", no_input)?;
    vault.set_password(&password)?;
    report(ctx, "Password set. Run `diary mode full` to encrypt your entries.");
    Ok(())
}

/// Re-encrypt everything under a new password.
///
/// The current password comes from `DIARY_PASSWORD` or a prompt, the new one
/// from `DIARY_NEW_PASSWORD` or a confirmed prompt.
pub fn handle_password_change(ctx: &AppContext, no_input: bool) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    if !vault.has_password()? {
        return Err(DiaryError::PasswordNotSet.into());
    }
    let current = fresh_auth(&vault, no_input)?;
    let password = new_password("DIARY_NEW_PASSWORD", no_input)?;

    let ui_ctx = ctx.ui(false);
    let spinner = Spinner::new(&ui_ctx, "Re-encrypting entries");
    vault.change_password_with(current, &password)?;
    spinner.clear();

    report(ctx, "Password changed.");
    Ok(())
}
