//! Error types and handling infrastructure for rtail.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! the library error type. The binary layers `anyhow` on top for context.
//!
//! ## Design Principles
//!
//! - **User-friendly messages**: Errors should provide actionable feedback
//! - **Context preservation**: Include the path and position that failed
//! - **Boundary first**: Validation and access errors never reach the reader

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rtail operations.
///
/// Covers request validation at the HTTP boundary, access control, the I/O
/// failures of a reverse scan, and the ways a scan can be interrupted.
#[derive(Error, Debug)]
pub enum TailError {
    /// A required request parameter is absent or malformed
    #[error("Invalid request: {message}")]
    Validation { message: String },

    /// Requested path is not in the access registry
    #[error("Access denied for log file: {path}")]
    AccessDenied { path: PathBuf },

    /// The log file could not be opened for reading
    #[error("Failed to open log file {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The size of the log file could not be determined
    #[error("Failed to stat log file {path}: {source}")]
    StatFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A chunk read failed part way through the scan
    #[error("Failed to read log file {path} at byte {position}: {source}")]
    ReadFailed {
        path: PathBuf,
        position: u64,
        #[source]
        source: std::io::Error,
    },

    /// A configured log location is missing or not a directory
    #[error("Invalid log location {path}: {message}")]
    InvalidLocation { path: PathBuf, message: String },

    /// Reader settings that cannot drive a scan
    #[error("Invalid tail settings: {message}")]
    InvalidSettings { message: String },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The consumer of the output transport went away
    #[error("Output consumer disconnected")]
    Disconnected,

    /// The operation was cancelled before it finished
    #[error("Tail operation cancelled")]
    Cancelled,
}

/// Standard Result type for rtail operations.
pub type Result<T> = std::result::Result<T, TailError>;

impl TailError {
    /// Create a Validation error with a descriptive message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an AccessDenied error for the given path
    pub fn access_denied(path: impl Into<PathBuf>) -> Self {
        Self::AccessDenied { path: path.into() }
    }

    /// Create an InvalidLocation error for a configured root
    pub fn invalid_location(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidLocation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an InvalidSettings error with a descriptive message
    pub fn invalid_settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            message: message.into(),
        }
    }

    /// Create a Config error with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True when the operation stopped because nobody wants the output anymore.
    ///
    /// Such stops are not failures: the failure hook is skipped and the
    /// scan reports a cancelled outcome instead.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Disconnected)
    }

    /// True for errors raised while touching the log file itself
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::OpenFailed { .. } | Self::StatFailed { .. } | Self::ReadFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_error_display_messages() {
        let denied = TailError::access_denied("/var/log/secret.log");
        assert_eq!(
            denied.to_string(),
            "Access denied for log file: /var/log/secret.log"
        );

        let validation = TailError::validation("fileName parameter is missing or invalid");
        assert_eq!(
            validation.to_string(),
            "Invalid request: fileName parameter is missing or invalid"
        );

        let read = TailError::ReadFailed {
            path: PathBuf::from("/test/file.log"),
            position: 4096,
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "short read"),
        };
        assert_eq!(
            read.to_string(),
            "Failed to read log file /test/file.log at byte 4096: short read"
        );
    }

    #[test]
    fn test_cancellation_classification() {
        assert!(TailError::Cancelled.is_cancellation());
        assert!(TailError::Disconnected.is_cancellation());
        assert!(!TailError::validation("x").is_cancellation());

        let open = TailError::OpenFailed {
            path: PathBuf::from("missing.log"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(open.is_io());
        assert!(!open.is_cancellation());
    }

    #[test]
    fn test_io_source_is_preserved() {
        use std::error::Error as _;

        let stat = TailError::StatFailed {
            path: PathBuf::from("a.log"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let source = stat.source().expect("stat error carries its io source");
        assert_eq!(source.to_string(), "denied");
    }
}
