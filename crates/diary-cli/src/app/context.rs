//! Application context for the Diary CLI.
//!
//! Bundles CLI arguments with the lazily loaded config and opens the
//! storage, vault and biometric bridge every command works against.

use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use diary_core::biometric::BiometricBridge;
use diary_core::storage::SqliteStorage;
use diary_core::{Origin, Vault};

use crate::authenticator::TerminalAuthenticator;
use crate::cli::Cli;
use crate::config::{
    authenticator_store_path, read_config, DiaryConfig, DEFAULT_DAEMON_IDLE_SECONDS,
};
use crate::errors::CliError;
use crate::ui::UiContext;
use crate::volatile::DaemonVolatileStore;

use super::resolver::{missing_diary_message, resolve_config_path};

/// The vault as the CLI uses it: SQLite settings and entries, daemon-backed session.
pub type CliVault = Vault<SqliteStorage, DaemonVolatileStore>;

pub type CliBridge<'v> =
    BiometricBridge<&'v SqliteStorage, &'v DaemonVolatileStore, TerminalAuthenticator>;

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<DiaryConfig>>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// The config file, `None` when it does not exist yet.
    pub fn config(&self) -> anyhow::Result<Option<&DiaryConfig>> {
        let config = self.config.get_or_try_init(|| -> anyhow::Result<_> {
            let path = resolve_config_path()?;
            if !path.exists() {
                return Ok(None);
            }
            read_config(&path).map(Some)
        })?;
        Ok(config.as_ref())
    }

    /// UI context honoring `--no-color` and `[ui] color`.
    pub fn ui(&self, json: bool) -> UiContext {
        let color = self
            .config()
            .ok()
            .flatten()
            .map(|c| c.ui.color)
            .unwrap_or(true);
        UiContext::from_env(json, self.cli.no_color, color)
    }

    /// Diary path from `--diary`/`DIARY_PATH`, else the config file.
    pub fn diary_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = self.cli.diary.as_ref() {
            return Ok(PathBuf::from(path));
        }
        match self.config()? {
            Some(config) => Ok(PathBuf::from(&config.diary.path)),
            None => Err(CliError::not_found(
                "No diary is configured.",
                "Hint: Run `diary init` or pass --diary PATH.",
            )
            .into()),
        }
    }

    /// The configured origin, `http://localhost` by default.
    pub fn origin(&self) -> anyhow::Result<Origin> {
        match self.config()? {
            Some(config) => Ok(Origin::parse(&config.platform.origin)?),
            None => Ok(Origin::localhost()),
        }
    }

    fn daemon_idle_seconds(&self) -> anyhow::Result<u64> {
        Ok(self
            .config()?
            .map(|c| c.session.daemon_idle_seconds)
            .unwrap_or(DEFAULT_DAEMON_IDLE_SECONDS))
    }

    /// Open the existing diary database.
    pub fn open_storage(&self) -> anyhow::Result<SqliteStorage> {
        let path = self.diary_path()?;
        if !path.exists() {
            return Err(CliError::not_found(
                missing_diary_message(&path),
                "Hint: Check --diary or the [diary] path in your config.",
            )
            .into());
        }
        Ok(SqliteStorage::open(&path)?)
    }

    pub fn volatile_store(&self) -> anyhow::Result<DaemonVolatileStore> {
        DaemonVolatileStore::new(&self.diary_path()?, self.daemon_idle_seconds()?)
    }

    pub fn open_vault(&self) -> anyhow::Result<CliVault> {
        let storage = self.open_storage()?;
        Ok(Vault::new(storage, self.volatile_store()?, self.origin()?))
    }

    /// Biometric bridge over the vault's own settings and volatile store.
    pub fn bridge<'v>(&self, vault: &'v CliVault) -> anyhow::Result<CliBridge<'v>> {
        let authenticator = TerminalAuthenticator::new(authenticator_store_path()?);
        Ok(BiometricBridge::new(
            vault.store(),
            vault.session().store(),
            authenticator,
            vault.origin().clone(),
        ))
    }
}
