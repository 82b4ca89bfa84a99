use diary_core::crypto::ensure_available;
use diary_core::EncryptionMode;

use crate::app::{missing_diary_message, resolve_config_path, AppContext};
use crate::volatile::{daemon_running, socket_path};

pub fn handle_doctor(ctx: &AppContext) -> anyhow::Result<()> {
    let config_path = resolve_config_path()?;
    let config_state = if config_path.exists() {
        ctx.config()
            .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
        "OK"
    } else if ctx.cli().diary.is_some() {
        "not found (using --diary)"
    } else {
        eprintln!("Doctor: FAILED");
        eprintln!("- config: missing ({})", config_path.display());
        eprintln!("Hint: Run `diary init` to create a diary.");
        return Err(anyhow::anyhow!("Diary is not initialized"));
    };

    let diary_path = ctx.diary_path()?;
    if !diary_path.exists() {
        eprintln!("{}", missing_diary_message(&diary_path));
        return Err(anyhow::anyhow!("Diary file missing"));
    }

    let vault = ctx.open_vault()?;
    let mode = vault.mode()?;
    let origin = vault.origin().clone();
    let crypto = ensure_available(&origin);
    if mode == EncryptionMode::Full {
        if let Err(err) = crypto.as_ref() {
            eprintln!("Doctor: FAILED");
            eprintln!("- encryption: {}", err);
            eprintln!("Hint: Set `[platform] origin` to an https:// or localhost origin.");
            return Err(anyhow::anyhow!("Doctor failed"));
        }
        if !vault.has_password()? {
            eprintln!("Doctor: FAILED");
            eprintln!("- password: missing while encryption is on");
            eprintln!("Hint: Run `diary password set`.");
            return Err(anyhow::anyhow!("Doctor failed"));
        }
    }

    let biometric = ctx.bridge(&vault)?.state()?;
    let daemon = if daemon_running(&socket_path()?)? {
        "running"
    } else {
        "stopped"
    };

    if !ctx.quiet() {
        println!("Doctor: OK");
        println!("- config: {} ({})", config_state, config_path.display());
        println!("- diary: OK ({})", diary_path.display());
        println!("- encryption: {}", mode);
        match crypto {
            Ok(()) => println!("- crypto: OK ({})", origin),
            Err(err) => println!("- crypto: unavailable ({})", err),
        }
        println!("- session daemon: {}", daemon);
        println!("- biometric: {}", biometric.as_str());
    }
    Ok(())
}
