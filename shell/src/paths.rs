/// Canonical file paths for Deckwatch data files.
///
/// Everything lives under one per-user directory:
///   - config.toml  Shell settings (game executable, locale, relauncher).
///   - decks.toml   Configuration Store: deck catalog and windows-locked flag.
///   - logs/        Rolling log files.
use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR_NAME: &str = "Deckwatch";
const XDG_APP_DIR_NAME: &str = "deckwatch";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STORE_FILE_NAME: &str = "decks.toml";
pub const LOG_DIR_NAME: &str = "logs";

/// Returns the Deckwatch application data directory:
///   - Windows: %APPDATA%\Deckwatch
///   - macOS:   ~/Library/Application Support/Deckwatch
///   - other:   $XDG_CONFIG_HOME/deckwatch, or ~/.config/deckwatch
pub fn app_data_dir() -> Result<PathBuf> {
    if cfg!(windows) {
        let appdata = std::env::var("APPDATA").context("APPDATA environment variable not set")?;
        return Ok(PathBuf::from(appdata).join(APP_DIR_NAME));
    }
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !cfg!(target_os = "macos") && !xdg.is_empty() {
            return Ok(PathBuf::from(xdg).join(XDG_APP_DIR_NAME));
        }
    }
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let home = PathBuf::from(home);
    if cfg!(target_os = "macos") {
        Ok(home.join("Library").join("Application Support").join(APP_DIR_NAME))
    } else {
        Ok(home.join(".config").join(XDG_APP_DIR_NAME))
    }
}

pub fn config_file_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join(CONFIG_FILE_NAME))
}

pub fn store_file_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join(STORE_FILE_NAME))
}

pub fn log_dir() -> Result<PathBuf> {
    Ok(app_data_dir()?.join(LOG_DIR_NAME))
}
