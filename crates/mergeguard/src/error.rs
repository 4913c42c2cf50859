//! Error types for mergeguard.
//!
//! This module defines all error types used throughout the mergeguard crate.
//! Conflict markers found in scanned files are *findings*, not errors; the
//! variants here cover operational failures only.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for mergeguard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// A path given on the command line does not exist.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A file is not valid UTF-8 text.
    #[error("{path} is not valid UTF-8 text")]
    NotText {
        /// Path of the file.
        path: PathBuf,
    },

    /// Directory traversal failed.
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    // === Resolution Errors ===
    /// The file changed on disk between reading and writing.
    #[error("{path} changed on disk while resolving; refusing to overwrite")]
    FileChanged {
        /// Path of the file.
        path: PathBuf,
    },

    /// The base strategy was requested but a block has no base section.
    #[error("conflict at line {line} has no base section (not a diff3-style conflict)")]
    MissingBase {
        /// Opening line of the offending block.
        line: usize,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// An exclude pattern is not a valid glob.
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        /// The offending pattern.
        pattern: String,
        /// The underlying error.
        #[source]
        source: glob::PatternError,
    },

    /// A marker pattern failed to compile.
    #[error("invalid marker pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for mergeguard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a file read error.
    #[must_use]
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Check if this error is caused by bad configuration.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } | Self::InvalidGlob { .. }
        )
    }
}
