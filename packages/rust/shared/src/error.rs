//! Error types for VTC Finder.
//!
//! Library crates use [`VtcFinderError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all VTC Finder operations.
#[derive(Debug, thiserror::Error)]
pub enum VtcFinderError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a page.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed input (event URL, page markup, catalog entry).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Catalog serialization error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid user-supplied value (filter criteria, CLI input).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VtcFinderError>;

impl VtcFinderError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = VtcFinderError::parse("no event id in 'https://x/events/abc'");
        assert_eq!(
            err.to_string(),
            "parse error: no event id in 'https://x/events/abc'"
        );

        let err = VtcFinderError::Network("https://x/vtc/1: HTTP 404 Not Found".into());
        assert!(err.to_string().starts_with("network error:"));
    }

    #[test]
    fn io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = VtcFinderError::io("/tmp/vtcs_source.json", source);
        assert!(err.to_string().contains("vtcs_source.json"));
    }
}
