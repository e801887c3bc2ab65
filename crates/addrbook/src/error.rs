//! Error types for the address book facade.

use addrbook_core::{UnknownField, ValidationError};
use addrbook_store::StoreError;
use thiserror::Error;

/// Errors that can occur during address book operations.
#[derive(Debug, Error)]
pub enum BookError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Entry input failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl BookError {
    /// HTTP status code an HTTP facade should answer with.
    ///
    /// Successful calls map to 200 (201 for a stored add); this covers the
    /// failures.
    pub fn http_status(&self) -> u16 {
        match self {
            BookError::Store(StoreError::NotFound(_)) => 404,
            BookError::Store(StoreError::InvalidField(_) | StoreError::Validation(_))
            | BookError::Validation(_) => 400,
            BookError::Store(StoreError::InvalidResource(_) | StoreError::ResourceUnavailable(_))
            | BookError::Config(_)
            | BookError::ConfigParse(_) => 500,
        }
    }
}

impl From<UnknownField> for BookError {
    fn from(e: UnknownField) -> Self {
        BookError::Store(e.into())
    }
}

/// Result type for address book operations.
pub type Result<T> = std::result::Result<T, BookError>;
