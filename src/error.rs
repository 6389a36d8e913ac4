//! Error types for petune
//!
//! This module defines all error types used throughout the application,
//! providing detailed error information for debugging and user feedback.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for petune operations
#[derive(Error, Debug)]
pub enum TuneError {
    /// I/O error while reading an inventory or writing output
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed role values or node entries in an inventory
    #[error("Invalid inventory: {0}")]
    InvalidInventory(String),

    /// Role combination that cannot be classified
    #[error("Unsupported topology: {0}")]
    UnsupportedTopology(String),

    /// Host below the minimum system requirements
    #[error("Insufficient resources on '{host}': {cpu} CPU(s) / {ram_mb} MB RAM (minimum {min_cpu} CPU(s) / {min_ram_mb} MB RAM)")]
    InsufficientResources {
        host: String,
        cpu: u32,
        ram_mb: u64,
        min_cpu: u32,
        min_ram_mb: u64,
    },

    /// Magnitude string that cannot be parsed
    #[error("Invalid unit format: '{0}'")]
    InvalidUnitFormat(String),

    /// Host facts could not be retrieved
    #[error("Unable to retrieve facts for '{host}': {message}")]
    UnavailableFacts { host: String, message: String },

    /// Serialization or deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Multiple errors occurred
    #[error("Multiple errors occurred ({count} errors)")]
    MultipleErrors {
        count: usize,
        errors: Vec<TuneError>,
    },
}

impl TuneError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid inventory error
    pub fn inventory(message: impl Into<String>) -> Self {
        Self::InvalidInventory(message.into())
    }

    /// Create an unavailable facts error
    pub fn facts(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnavailableFacts {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Check if this error only warns about a result that was still produced
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::InsufficientResources { .. })
    }

    /// Get the host associated with this error, if any
    pub fn host(&self) -> Option<&str> {
        match self {
            Self::InsufficientResources { host, .. } | Self::UnavailableFacts { host, .. } => {
                Some(host)
            }
            _ => None,
        }
    }
}

/// Result type alias for petune operations
pub type Result<T> = std::result::Result<T, TuneError>;

impl From<serde_json::Error> for TuneError {
    fn from(err: serde_json::Error) -> Self {
        TuneError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for TuneError {
    fn from(err: serde_yaml::Error) -> Self {
        TuneError::Serialization(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| TuneError::io(path, e))
    }
}

/// Collects multiple results into a single result
pub fn collect_errors<T>(results: Vec<Result<T>>) -> Result<Vec<T>> {
    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(value) => successes.push(value),
            Err(e) => errors.push(e),
        }
    }

    match errors.len() {
        0 => Ok(successes),
        1 => Err(errors.remove(0)),
        count => Err(TuneError::MultipleErrors { count, errors }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = TuneError::io("/etc/petune/inventory.yaml", io_err);
        assert!(err.to_string().contains("/etc/petune/inventory.yaml"));
    }

    #[test]
    fn test_with_path_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");

        let err = std::fs::read_to_string(&missing).with_path(&missing).unwrap_err();
        match err {
            TuneError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_insufficient_resources_is_warning() {
        let warning = TuneError::InsufficientResources {
            host: "master".to_string(),
            cpu: 2,
            ram_mb: 4096,
            min_cpu: 4,
            min_ram_mb: 8192,
        };
        assert!(warning.is_warning());
        assert_eq!(warning.host(), Some("master"));

        let fatal = TuneError::UnsupportedTopology("unknown infrastructure".to_string());
        assert!(!fatal.is_warning());
        assert_eq!(fatal.host(), None);
    }

    #[test]
    fn test_collect_errors() {
        let results: Vec<Result<i32>> = vec![Ok(1), Ok(2), Ok(3)];
        assert_eq!(collect_errors(results).unwrap(), vec![1, 2, 3]);

        let results: Vec<Result<i32>> = vec![
            Ok(1),
            Err(TuneError::facts("a", "unreachable")),
            Err(TuneError::facts("b", "unreachable")),
        ];
        match collect_errors(results) {
            Err(TuneError::MultipleErrors { count, .. }) => assert_eq!(count, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
