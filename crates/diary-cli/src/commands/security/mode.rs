use diary_core::EncryptionMode;

use crate::app::{fresh_auth, new_password, unlock_with_password, AppContext};
use crate::cli::ModeArgs;
use crate::ui::{badge, print, Badge, OutputMode, Spinner};

pub fn handle_mode(ctx: &AppContext, args: &ModeArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    let target: EncryptionMode = args.mode.into();
    let current = vault.mode()?;
    let ui_ctx = ctx.ui(false);

    if current == target {
        if !ctx.quiet() {
            match ui_ctx.mode {
                OutputMode::Pretty => print(
                    &ui_ctx,
                    &badge(
                        &ui_ctx,
                        Badge::Info,
                        &format!("Encryption is already {}", target),
                    ),
                ),
                OutputMode::Plain | OutputMode::Json => {
                    println!("status=unchanged");
                    println!("mode={}", target);
                }
            }
        }
        return Ok(());
    }

    let fresh = match target {
        EncryptionMode::Full => {
            if vault.has_password()? {
                // Mode `none` never needs an unlock, so open the session here.
                if !vault.session().is_valid()? {
                    unlock_with_password(&vault, args.no_input)?;
                }
            } else {
                let password = new_password("DIARY_PASSWORD", args.no_input)?;
                vault.set_password(&password)?;
            }
            None
        }
        EncryptionMode::None => Some(fresh_auth(&vault, args.no_input)?),
    };

    let spinner = Spinner::new(
        &ui_ctx,
        match target {
            EncryptionMode::Full => "Encrypting entries",
            EncryptionMode::None => "Decrypting entries",
        },
    );
    vault.set_mode(target, fresh)?;
    spinner.clear();

    if ctx.quiet() {
        return Ok(());
    }
    match ui_ctx.mode {
        OutputMode::Pretty => {
            let message = match target {
                EncryptionMode::Full => "Encryption enabled. Every entry is now encrypted.",
                EncryptionMode::None => {
                    "Encryption disabled. Entries are stored in plaintext and biometric unlock was removed."
                }
            };
            print(&ui_ctx, &badge(&ui_ctx, Badge::Ok, message));
        }
        OutputMode::Plain | OutputMode::Json => {
            println!("status=ok");
            println!("mode={}", target);
        }
    }
    Ok(())
}
