//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected <number> followed by h, m or s (e.g., 90s, 5m, 1h30m)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a file name is not a recording name
#[derive(Debug, Clone, Error)]
#[error("Not a recording file name: \"{input}\". Expected rec_<timestamp>.<ext>")]
pub struct RecordingNameError {
    pub input: String,
}

/// Error when parsing a proximity threshold mode
#[derive(Debug, Clone, Error)]
#[error("Invalid proximity threshold: \"{input}\". Valid values are: full, half")]
pub struct ThresholdModeError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
