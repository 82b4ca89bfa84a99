use std::io::IsTerminal;
use std::path::PathBuf;

use dialoguer::{theme::ColorfulTheme, Select};
use diary_core::blocks::{Block, BlockType};
use diary_core::settings::{keys, SettingsStore};
use diary_core::storage::{NewTemplate, SqliteStorage, StorageEngine};
use diary_core::{EncryptionMode, Origin, Vault};

use crate::app::{new_password, resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::{default_diary_path, read_config, write_config, DiaryConfig};
use crate::constants::DEFAULT_TEMPLATE_NAME;
use crate::errors::CliError;
use crate::ui::{badge, header, hint, print, Badge, OutputMode, Spinner};
use crate::volatile::DaemonVolatileStore;

/// Blocks of the template every new diary starts with.
fn default_template() -> NewTemplate {
    NewTemplate::new(
        DEFAULT_TEMPLATE_NAME,
        vec![
            Block::new(BlockType::Textarea, "Notes"),
            Block::new(BlockType::Slider, "Mood").with_range(1.0, 10.0, 1.0),
            Block::new(BlockType::Multiselect, "Activities"),
        ],
    )
}

fn choose_mode(interactive: bool) -> anyhow::Result<EncryptionMode> {
    if !interactive {
        return Ok(EncryptionMode::None);
    }
    let options = [
        "No encryption (entries readable without a password)",
        "Full encryption (password required to read entries)",
    ];
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Encryption")
        .default(1)
        .items(&options)
        .interact()?;
    Ok(if choice == 1 {
        EncryptionMode::Full
    } else {
        EncryptionMode::None
    })
}

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let ui_ctx = ctx.ui(false);
    let interactive = std::io::stdin().is_terminal() && !args.no_input;

    let diary_path = match args.path.as_ref().or(ctx.cli().diary.as_ref()) {
        Some(path) => PathBuf::from(path),
        None => default_diary_path()?,
    };
    if diary_path.exists() {
        return Err(CliError::invalid_input(format!(
            "A diary already exists at {}",
            diary_path.display()
        ))
        .into());
    }

    let config_path = resolve_config_path()?;
    let mut config = if config_path.exists() {
        let mut existing = read_config(&config_path)?;
        existing.diary.path = diary_path.to_string_lossy().to_string();
        existing
    } else {
        DiaryConfig::new(diary_path.clone())
    };
    if let Some(origin) = args.origin.as_ref() {
        Origin::parse(origin)?;
        config.platform.origin = origin.trim().to_string();
    }
    let origin = Origin::parse(&config.platform.origin)?;

    if ui_ctx.mode.is_pretty() && !ctx.quiet() {
        println!("{}\n", header(&ui_ctx, "init", None));
    }

    let mode = match args.mode {
        Some(mode) => mode.into(),
        None => choose_mode(interactive)?,
    };
    // Fail before anything touches the disk.
    let password = if mode == EncryptionMode::Full {
        diary_core::crypto::ensure_available(&origin)?;
        Some(new_password("DIARY_PASSWORD", args.no_input)?)
    } else {
        None
    };

    if let Some(parent) = diary_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!("Failed to create diary directory {}: {}", parent.display(), e)
        })?;
    }
    let storage = SqliteStorage::create(&diary_path)?;
    storage.create_template(&default_template())?;
    write_config(&config_path, &config)?;

    let volatile = DaemonVolatileStore::new(&diary_path, config.session.daemon_idle_seconds)?;
    let vault = Vault::new(storage, volatile, origin);
    if let Some(password) = password.as_ref() {
        let spinner = Spinner::new(&ui_ctx, "Deriving key");
        vault.set_password(password)?;
        vault.set_mode(EncryptionMode::Full, None)?;
        spinner.clear();
    }
    vault.store().set_flag(keys::SETUP_COMPLETED, true)?;

    if ctx.quiet() {
        return Ok(());
    }
    match ui_ctx.mode {
        OutputMode::Pretty => {
            print(
                &ui_ctx,
                &badge(
                    &ui_ctx,
                    Badge::Ok,
                    &format!("Diary created at {}", diary_path.display()),
                ),
            );
            print(
                &ui_ctx,
                &badge(
                    &ui_ctx,
                    Badge::Ok,
                    &format!("Config written to {}", config_path.display()),
                ),
            );
            if mode == EncryptionMode::Full {
                print(
                    &ui_ctx,
                    &badge(
                        &ui_ctx,
                        Badge::Info,
                        "Entries are encrypted. This session stays unlocked until 24 hours of inactivity.",
                    ),
                );
            }
            println!();
            print(
                &ui_ctx,
                &hint(
                    &ui_ctx,
                    &format!(
                        "diary add {}  \u{00B7}  diary list  \u{00B7}  diary --help",
                        DEFAULT_TEMPLATE_NAME
                    ),
                ),
            );
        }
        OutputMode::Plain | OutputMode::Json => {
            println!("status=ok");
            println!("diary_path={}", diary_path.display());
            println!("config_path={}", config_path.display());
            println!("mode={}", mode);
        }
    }

    Ok(())
}
