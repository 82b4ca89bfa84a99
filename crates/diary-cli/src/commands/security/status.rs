use diary_core::settings::{keys, SettingsStore};

use crate::app::AppContext;
use crate::cli::StatusArgs;
use crate::ui::{header, kv, print};

pub fn handle_status(ctx: &AppContext, args: &StatusArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    let bridge = ctx.bridge(&vault)?;

    let mode = vault.mode()?;
    let has_password = vault.has_password()?;
    let unlocked = vault.session().is_valid()?;
    let biometric = bridge.state()?;
    let setup_completed = vault.store().get_flag(keys::SETUP_COMPLETED)?;
    let diary_path = ctx.diary_path()?;

    if args.json {
        let output = serde_json::json!({
            "diary_path": diary_path.display().to_string(),
            "encryption_mode": mode.as_str(),
            "password_set": has_password,
            "unlocked": unlocked,
            "needs_unlock": vault.needs_unlock()?,
            "needs_password_setup": vault.needs_password_setup()?,
            "biometric": biometric.as_str(),
            "origin": vault.origin().to_string(),
            "setup_completed": setup_completed,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let ui_ctx = ctx.ui(false);
    if ui_ctx.mode.is_pretty() && !ctx.quiet() {
        print(&ui_ctx, &header(&ui_ctx, "status", None));
    }
    let yes_no = |value: bool| if value { "yes" } else { "no" };
    let session = if unlocked {
        "unlocked"
    } else if mode.requires_unlock_at_start() {
        "locked"
    } else {
        "not needed"
    };
    for (key, value) in [
        ("Diary", diary_path.display().to_string()),
        ("Encryption", mode.to_string()),
        ("Password", yes_no(has_password).to_string()),
        ("Session", session.to_string()),
        ("Biometric", biometric.as_str().to_string()),
        ("Origin", vault.origin().to_string()),
    ] {
        print(&ui_ctx, &kv(&ui_ctx, key, &value));
    }
    Ok(())
}
