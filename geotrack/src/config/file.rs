//! Loading and saving the configuration file.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::tracking::TrackingOptions;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// Load options from the default config file path.
pub fn load() -> Result<TrackingOptions, ConfigFileError> {
    load_from(&config_file_path())
}

/// Load options from `path`.
///
/// A missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<TrackingOptions, ConfigFileError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(TrackingOptions::default());
    }

    let ini = Ini::load_from_file(path)?;
    super::parser::parse_ini(&ini)
}

/// Write `options` to `path`, creating parent directories as needed.
pub fn save_to(options: &TrackingOptions, path: &Path) -> Result<(), ConfigFileError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
    }

    let content = super::writer::to_ini_string(options);
    std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
}

/// Directory holding the config file (`<config dir>/geotrack`).
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("geotrack")
}

/// Path of the default config file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
