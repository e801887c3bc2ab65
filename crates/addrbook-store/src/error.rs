//! Error types for the store module.
//!
//! Backend-specific failures (SQLite, CSV, filesystem) never leak out of a
//! store. They are converted into the kinds below at the point they occur.

use addrbook_core::{EntryId, UnknownField, ValidationError};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The resource locator has the wrong shape for this backend.
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    /// I/O or connection failure, or the store is not open.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Field name outside the fixed field set.
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// Operation referenced an id that is not stored.
    #[error("entry not found: {0}")]
    NotFound(EntryId),

    /// An updated value failed entry validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl StoreError {
    pub(crate) fn not_open() -> Self {
        StoreError::ResourceUnavailable("store is not open".into())
    }

    pub(crate) fn unbound() -> Self {
        StoreError::ResourceUnavailable("no resource locator bound".into())
    }
}

impl From<UnknownField> for StoreError {
    fn from(e: UnknownField) -> Self {
        StoreError::InvalidField(e.0)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::ResourceUnavailable(format!("database error: {e}"))
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::ResourceUnavailable(format!("csv error: {e}"))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::ResourceUnavailable(format!("I/O error: {e}"))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_errors_become_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(StoreError::from(io), StoreError::ResourceUnavailable(_)));

        let sql = rusqlite::Error::InvalidQuery;
        assert!(matches!(StoreError::from(sql), StoreError::ResourceUnavailable(_)));
    }

    #[test]
    fn test_unknown_field_becomes_invalid_field() {
        let err = StoreError::from(UnknownField("zip".into()));
        assert!(matches!(err, StoreError::InvalidField(ref name) if name == "zip"));
        assert_eq!(err.to_string(), "invalid field: zip");
    }
}
