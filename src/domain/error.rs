//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected <number><unit> with units h, m, s or ms (e.g., 500ms, 30s, 2m, 1m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when parsing a byte size string
#[derive(Debug, Clone, Error)]
#[error("Invalid size: \"{input}\". Expected a byte count with an optional unit (e.g., 10MiB, 512KiB, 25MB)")]
pub struct ByteSizeParseError {
    pub input: String,
}

/// Error when an entity kind tag is malformed
#[derive(Debug, Clone, Error)]
#[error("Invalid entity kind: \"{input}\". Kinds use lowercase letters, digits, '_' or '-'")]
pub struct InvalidKindError {
    pub input: String,
}

/// Source audio that cannot be transcribed at all
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid input audio: {reason}")]
pub struct InvalidInputError {
    pub reason: String,
}

impl InvalidInputError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
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
