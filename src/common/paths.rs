//! Configuration file location
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/psx-test-runner/`
//! - macOS: `~/Library/Application Support/psx-test-runner/`
//! - Windows: `%APPDATA%\psx-test-runner\`

use std::path::PathBuf;

/// Application name used for the config directory
const APP_NAME: &str = "psx-test-runner";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
