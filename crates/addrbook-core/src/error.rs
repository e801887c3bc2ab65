//! Error types for the address book core.

use thiserror::Error;

use crate::field::EntryField;

/// Validation errors raised while constructing or updating an entry.
///
/// Every variant names the field that failed, so callers can report
/// the offending input without parsing the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required and must not be empty")]
    MissingRequired(EntryField),

    #[error("invalid birthdate format: {0:?} (expected YYYY-MM-DD)")]
    Birthdate(String),

    #[error("invalid email address: {0:?}")]
    Email(String),

    #[error("postal code must be a positive integer: {0:?}")]
    PostalCode(String),
}

impl ValidationError {
    /// The field that failed validation.
    pub fn field(&self) -> EntryField {
        match self {
            ValidationError::MissingRequired(field) => *field,
            ValidationError::Birthdate(_) => EntryField::Birthdate,
            ValidationError::Email(_) => EntryField::Email,
            ValidationError::PostalCode(_) => EntryField::PostalCode,
        }
    }
}

/// A field name outside the fixed set of entry fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field: {0:?}")]
pub struct UnknownField(pub String);
