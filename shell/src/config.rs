use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::event::ShellEvent;
use crate::watch;

pub const MIN_POLL_INTERVAL_SECS: u64 = 1;
pub const MAX_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_GAME_EXECUTABLE: &str = "Hearthstone";
pub const DEFAULT_LOCALE: &str = "en";

/// Root configuration structure. Deserialized from `<app data>/config.toml`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub relaunch: RelaunchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Process name of the game, matched case-insensitively.
    #[serde(default = "default_game_executable")]
    pub game_executable: String,
    /// Process list polling period in seconds. Clamped to [1, 30].
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// UI language. Changing it requires a restart.
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            game_executable: DEFAULT_GAME_EXECUTABLE.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl GeneralConfig {
    pub fn effective_poll_interval(&self) -> u64 {
        self.poll_interval_secs
            .clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RelaunchConfig {
    /// Program that receives the application path on restart. Falls back to
    /// the platform launcher.
    pub launcher: Option<PathBuf>,
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Events to emit after a successful reload. A locale different from the one
/// last seen also raises [`ShellEvent::LocaleChanged`].
fn reload_events(current_locale: &mut String, config: Config) -> Vec<ShellEvent> {
    let locale_changed = config.general.locale != *current_locale;
    if locale_changed {
        info!(from = %current_locale, to = %config.general.locale, "[config] Locale changed");
        *current_locale = config.general.locale.clone();
    }
    let mut events = vec![ShellEvent::ConfigReloaded(config)];
    if locale_changed {
        events.push(ShellEvent::LocaleChanged);
    }
    events
}

/// Watches the config file and sends `ConfigReloaded` (plus `LocaleChanged`
/// when the locale differs from `initial_locale`) on every successful reload.
pub async fn watch_config(path: PathBuf, initial_locale: String, tx: mpsc::Sender<ShellEvent>) {
    let mut locale = initial_locale;
    let reload_path = path.clone();
    watch::watch_file(path, tx, move || match load_or_default(&reload_path) {
        Ok(config) => reload_events(&mut locale, config),
        Err(e) => {
            error!("[config] Failed to reload config: {e:#}");
            Vec::new()
        }
    })
    .await
}

fn default_game_executable() -> String {
    DEFAULT_GAME_EXECUTABLE.to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}
