//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.
//! Handles ~/.taskdeck/ and the files inside it.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Taskdeck directory (~/.taskdeck/)
pub fn taskdeck_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".taskdeck"))
}

/// Get the config file path (~/.taskdeck/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(taskdeck_dir()?.join("config.json"))
}

/// Get the database file path (~/.taskdeck/data.db)
pub fn database_path() -> AppResult<PathBuf> {
    Ok(taskdeck_dir()?.join("data.db"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the Taskdeck directory, creating if it doesn't exist
pub fn ensure_taskdeck_dir() -> AppResult<PathBuf> {
    let path = taskdeck_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
