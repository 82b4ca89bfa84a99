use diary_core::DiaryError;

use crate::app::{unlock_with_password, AppContext};
use crate::cli::UnlockArgs;
use crate::errors::CliError;
use crate::ui::{badge, print, Badge, OutputMode};

pub fn handle_unlock(ctx: &AppContext, args: &UnlockArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    if !vault.has_password()? {
        return Err(DiaryError::PasswordNotSet.into());
    }

    let method = if args.biometric {
        let bridge = ctx.bridge(&vault)?;
        if !vault.unlock_with_biometric(&bridge)? {
            return Err(CliError::auth_failed_with_hint(
                "Biometric unlock was cancelled.",
                "Hint: Run `diary unlock` to use your password instead.",
            )
            .into());
        }
        "biometric"
    } else {
        unlock_with_password(&vault, args.no_input)?;
        "password"
    };

    if ctx.quiet() {
        return Ok(());
    }
    let ui_ctx = ctx.ui(false);
    match ui_ctx.mode {
        OutputMode::Pretty => print(
            &ui_ctx,
            &badge(
                &ui_ctx,
                Badge::Ok,
                "Diary unlocked. The session ends after 24 hours of inactivity.",
            ),
        ),
        OutputMode::Plain | OutputMode::Json => {
            println!("status=ok");
            println!("method={}", method);
        }
    }
    Ok(())
}
