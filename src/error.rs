//! Custom error types for ksexpire
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for ksexpire operations
#[derive(Error, Debug)]
pub enum ExpireError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors, including sinks and sources that cannot be opened
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// A backup archive is structurally unusable
    #[error("Invalid backup archive: {0}")]
    InvalidArchive(String),

    /// A backup archive was produced by a newer format than this build reads
    #[error("Unsupported backup version {found} (this build supports up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ExpireError {
    /// Create a "not found" error for items
    pub fn item_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Item",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error means the archive cannot be restored
    pub fn is_archive_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidArchive(_) | Self::UnsupportedVersion { .. }
        )
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for ExpireError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExpireError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<zip::result::ZipError> for ExpireError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => Self::Io(io.to_string()),
            other => Self::InvalidArchive(other.to_string()),
        }
    }
}

/// Result type alias for ksexpire operations
pub type ExpireResult<T> = Result<T, ExpireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExpireError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = ExpireError::item_not_found("42");
        assert_eq!(err.to_string(), "Item not found: 42");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unsupported_version_error() {
        let err = ExpireError::UnsupportedVersion {
            found: 2,
            supported: 1,
        };
        assert_eq!(
            err.to_string(),
            "Unsupported backup version 2 (this build supports up to 1)"
        );
        assert!(err.is_archive_rejection());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ExpireError = io_err.into();
        assert!(matches!(err, ExpireError::Io(_)));
    }

    #[test]
    fn test_from_zip_error() {
        let err: ExpireError = zip::result::ZipError::InvalidArchive("bad header".into()).into();
        assert!(matches!(err, ExpireError::InvalidArchive(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: ExpireError = zip::result::ZipError::Io(io_err).into();
        assert!(matches!(err, ExpireError::Io(_)));
    }
}
