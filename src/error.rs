//! Error types for SweepGen
//!
//! Everything that can go wrong while building a sweep plan or writing the
//! generated script.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for SweepGen operations
#[derive(Error, Debug)]
pub enum SweepGenError {
    /// I/O error while reading a config file or writing the script
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Thread schedule cannot be built
    #[error("Invalid thread schedule: {0}")]
    InvalidSchedule(String),

    /// Config file (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SweepGenError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for SweepGen operations
pub type Result<T> = std::result::Result<T, SweepGenError>;

impl From<std::io::Error> for SweepGenError {
    fn from(err: std::io::Error) -> Self {
        SweepGenError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SweepGenError {
    fn from(err: serde_json::Error) -> Self {
        SweepGenError::Serialization(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| SweepGenError::io(path, e))
    }
}
