//! Field validation: the pass/fail predicates an entry applies to itself.
//!
//! Each function takes raw text and either returns the normalized value or a
//! [`ValidationError`] naming the field. Empty optional text normalizes to
//! `None` rather than failing.

use chrono::NaiveDate;
use validator::ValidateEmail;

use crate::error::ValidationError;
use crate::field::EntryField;

/// The birthdate wire format.
pub const BIRTHDATE_FORMAT: &str = "%Y-%m-%d";

/// Normalize optional text: empty becomes `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Require a non-blank name field.
pub fn validate_required(field: EntryField, value: String) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingRequired(field));
    }
    Ok(value)
}

/// Parse an ISO `YYYY-MM-DD` birthdate.
///
/// The shape is checked strictly (four-digit year, two-digit month and day)
/// before calendar validation, so `2000-1-5` is rejected.
pub fn parse_birthdate(value: &str) -> Result<NaiveDate, ValidationError> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(ValidationError::Birthdate(value.to_string()));
    }

    NaiveDate::parse_from_str(value, BIRTHDATE_FORMAT)
        .map_err(|_| ValidationError::Birthdate(value.to_string()))
}

/// Parse a postal code: a positive integer.
pub fn parse_postal_code(value: &str) -> Result<u32, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::PostalCode(value.to_string()));
    }
    match trimmed.parse::<u32>() {
        Ok(code) if code > 0 => Ok(code),
        _ => Err(ValidationError::PostalCode(value.to_string())),
    }
}

/// Validate an email address and return it trimmed.
///
/// Two checks: address syntax (via `validator`), and a deliverable-shaped
/// domain. A domain without a dot (`user@localhost`) or with an empty label
/// cannot receive mail from the outside and is rejected.
pub fn validate_email(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim().to_string();
    if !trimmed.validate_email() || !has_deliverable_domain(&trimmed) {
        return Err(ValidationError::Email(value.to_string()));
    }
    Ok(trimmed)
}

fn has_deliverable_domain(email: &str) -> bool {
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return false;
    }
    // Top-level domains are alphabetic.
    labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}
