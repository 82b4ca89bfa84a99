use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default idle lifetime of the volatile daemon: one day.
pub const DEFAULT_DAEMON_IDLE_SECONDS: u64 = 86_400;

pub const DEFAULT_ORIGIN: &str = "http://localhost";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaryConfig {
    pub diary: DiarySection,
    #[serde(default)]
    pub platform: PlatformSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub ui: UiSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarySection {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSection {
    /// Origin the app considers itself served from.
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for PlatformSection {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSection {
    /// Seconds the volatile daemon survives without requests.
    #[serde(default = "default_daemon_idle_seconds")]
    pub daemon_idle_seconds: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            daemon_idle_seconds: default_daemon_idle_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSection {
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            color: default_color(),
        }
    }
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_daemon_idle_seconds() -> u64 {
    DEFAULT_DAEMON_IDLE_SECONDS
}

fn default_color() -> bool {
    true
}

impl DiaryConfig {
    pub fn new(diary_path: PathBuf) -> Self {
        Self {
            diary: DiarySection {
                path: diary_path.to_string_lossy().to_string(),
            },
            platform: PlatformSection::default(),
            session: SessionSection::default(),
            ui: UiSection::default(),
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_diary_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("diary.db"))
}

/// Where the terminal authenticator keeps the credentials it issued.
pub fn authenticator_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("authenticator.json"))
}

pub fn read_config(path: &Path) -> anyhow::Result<DiaryConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &DiaryConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("diary"));
        }
    }
    Ok(home_dir()?.join(".config").join("diary"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("diary"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("diary"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
