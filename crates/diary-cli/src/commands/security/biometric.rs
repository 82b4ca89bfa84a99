use diary_core::biometric::BiometricState;
use diary_core::{DiaryError, EncryptionMode};

use crate::app::{verified_password, AppContext};
use crate::errors::CliError;
use crate::ui::{badge, header, kv, print, Badge, OutputMode};

/// Register a platform credential and cache the verified password behind it.
pub fn handle_biometric_enable(ctx: &AppContext, no_input: bool) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    if vault.mode()? != EncryptionMode::Full {
        return Err(CliError::invalid_input(
            "Biometric unlock needs encryption. Run `diary mode full` first.",
        )
        .into());
    }
    let bridge = ctx.bridge(&vault)?;
    if !bridge.is_available() {
        return Err(DiaryError::BiometricUnavailable.into());
    }

    let password = verified_password(&vault, no_input)?;
    if !bridge.register(&password)? {
        return Err(CliError::auth_failed("Biometric registration was not completed.").into());
    }

    if !ctx.quiet() {
        let ui_ctx = ctx.ui(false);
        match ui_ctx.mode {
            OutputMode::Pretty => print(
                &ui_ctx,
                &badge(
                    &ui_ctx,
                    Badge::Ok,
                    "Biometric unlock enabled until the volatile store is cleared.",
                ),
            ),
            OutputMode::Plain | OutputMode::Json => {
                println!("status=ok");
                println!("biometric=registered");
            }
        }
    }
    Ok(())
}

pub fn handle_biometric_disable(ctx: &AppContext) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    ctx.bridge(&vault)?.disable()?;

    if !ctx.quiet() {
        let ui_ctx = ctx.ui(false);
        match ui_ctx.mode {
            OutputMode::Pretty => {
                print(&ui_ctx, &badge(&ui_ctx, Badge::Ok, "Biometric unlock disabled."))
            }
            OutputMode::Plain | OutputMode::Json => {
                println!("status=ok");
                println!("biometric=disabled");
            }
        }
    }
    Ok(())
}

pub fn handle_biometric_status(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    let bridge = ctx.bridge(&vault)?;
    let state = bridge.state()?;
    let cached = bridge.has_cached_password()?;
    // A registration whose cached password is gone can no longer unlock.
    let stale = state == BiometricState::Registered && !cached;

    if json {
        let output = serde_json::json!({
            "state": state.as_str(),
            "available": bridge.is_available(),
            "enabled": bridge.is_enabled()?,
            "cached_password": cached,
            "stale": stale,
            "origin": vault.origin().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let ui_ctx = ctx.ui(false);
    if ui_ctx.mode.is_pretty() && !ctx.quiet() {
        print(&ui_ctx, &header(&ui_ctx, "biometric", None));
    }
    print(&ui_ctx, &kv(&ui_ctx, "State", state.as_str()));
    print(&ui_ctx, &kv(&ui_ctx, "Origin", &vault.origin().to_string()));
    if stale {
        print(
            &ui_ctx,
            &badge(
                &ui_ctx,
                Badge::Warn,
                "The cached password expired. Run `diary biometric enable` again.",
            ),
        );
    } else if state == BiometricState::Unavailable
        && !vault.origin().allows_platform_authenticator()
    {
        print(
            &ui_ctx,
            &badge(
                &ui_ctx,
                Badge::Info,
                "Biometrics need an https origin with a real hostname (set [platform] origin).",
            ),
        );
    }
    Ok(())
}
