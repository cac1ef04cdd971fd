//! Where input-base keeps its settings file and rotated logs
//!
//! Resolved per call from the environment, so tests can point
//! `XDG_CONFIG_HOME` elsewhere.

use std::{env, fs, path::PathBuf};

use crate::error::{InputError, Result};

const APP_DIR: &str = "input-base";
const CONFIG_FILE: &str = "input.yaml";
const LOGS_DIR: &str = "logs";

/// Per-user directory owned by input-base
///
/// `%APPDATA%\input-base` on Windows. Elsewhere `$XDG_CONFIG_HOME/input-base`,
/// or `~/.config/input-base` when the variable is unset. `None` when neither
/// the environment nor the home directory can be found.
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let base = env::var_os("APPDATA").map(PathBuf::from);

    #[cfg(not(target_os = "windows"))]
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")));

    base.map(|dir| dir.join(APP_DIR))
}

/// Settings read by [`InputConfig::load`](crate::config::InputConfig::load)
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Target of the daily-rotated file log
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(LOGS_DIR))
}

fn create(path: PathBuf) -> Result<PathBuf> {
    fs::create_dir_all(&path).map_err(|source| InputError::ConfigIo {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// [`config_dir`], created if missing
pub fn ensure_config_dir() -> Result<PathBuf> {
    create(config_dir().ok_or(InputError::NoConfigDir)?)
}

/// [`logs_dir`], created if missing
pub fn ensure_logs_dir() -> Result<PathBuf> {
    create(ensure_config_dir()?.join(LOGS_DIR))
}
