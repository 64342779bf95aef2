//! Error types for the sceap core.
//!
//! Structural problems with a feeder list are never errors: they are reported
//! through [`crate::diagnostics`]. [`SceapError`] covers the failures that stop a
//! single operation, such as a catalog that cannot be parsed or a conductor
//! size missing from a catalog table.
//!
//! # Example
//!
//! ```
//! use sceap_core::{CableCatalog, CoreConfig, SceapError};
//!
//! let catalog = CableCatalog::builtin();
//! let err = catalog.entry(CoreConfig::ThreeCore, 7.0).unwrap_err();
//! assert!(matches!(err, SceapError::Lookup(_)));
//! ```

use thiserror::Error;

/// Unified error type for sceap operations.
#[derive(Error, Debug)]
pub enum SceapError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed or inconsistent reference catalog
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// A catalog table or entry required by the sizing engine is missing
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using SceapError.
pub type SceapResult<T> = Result<T, SceapError>;

impl From<String> for SceapError {
    fn from(s: String) -> Self {
        SceapError::Other(s)
    }
}

impl From<&str> for SceapError {
    fn from(s: &str) -> Self {
        SceapError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for SceapError {
    fn from(err: serde_json::Error) -> Self {
        SceapError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SceapError::Lookup("no catalog data for core config 5C".into());
        assert!(err.to_string().contains("Lookup error"));
        assert!(err.to_string().contains("5C"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SceapError = io_err.into();
        assert!(matches!(err, SceapError::Io(_)));
    }

    #[test]
    fn test_json_error_is_parse_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SceapError = json_err.into();
        assert!(matches!(err, SceapError::Parse(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> SceapResult<()> {
            Err(SceapError::Validation("fromBus equals toBus".into()))
        }

        fn outer() -> SceapResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
