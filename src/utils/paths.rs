use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

pub fn get_scopetui_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    Ok(home.join(".scopetui"))
}

pub fn get_config_path() -> Result<PathBuf> {
    let dir = get_scopetui_dir()?;
    Ok(dir.join("config.toml"))
}

pub fn get_crash_log_path() -> Result<PathBuf> {
    let dir = get_scopetui_dir()?;
    Ok(dir.join("crash.log"))
}

/// Log directory, e.g. `~/.local/share/scope-tui/logs` on Linux.
pub fn get_logs_dir() -> Result<PathBuf> {
    let data = dirs::data_local_dir().ok_or_else(|| anyhow!("Could not find data directory"))?;
    Ok(data.join("scope-tui").join("logs"))
}

pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))
}

/// User-tier settings file under a home directory.
pub fn user_settings_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".claude").join("settings.json")
}

/// Project-tier settings file under a working directory.
pub fn project_settings_path(working_dir: &Path) -> PathBuf {
    working_dir.join(".claude").join("settings.json")
}

/// Local override settings file under a working directory.
pub fn local_settings_path(working_dir: &Path) -> PathBuf {
    working_dir.join(".claude").join("settings.local.json")
}
