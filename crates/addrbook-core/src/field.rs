//! Field tags and typed field updates.
//!
//! The set of entry fields is closed. Anything addressing a field by name
//! (search, update) goes through [`EntryField`] so unknown names are rejected
//! at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownField;

/// One of the nine entry fields, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryField {
    Firstname,
    Lastname,
    Street,
    Number,
    PostalCode,
    Place,
    Birthdate,
    Phone,
    Email,
}

impl EntryField {
    /// All fields in declaration (and column) order.
    pub const ALL: [EntryField; 9] = [
        EntryField::Firstname,
        EntryField::Lastname,
        EntryField::Street,
        EntryField::Number,
        EntryField::PostalCode,
        EntryField::Place,
        EntryField::Birthdate,
        EntryField::Phone,
        EntryField::Email,
    ];

    /// The field name as used in CSV headers, SQL columns and JSON keys.
    pub const fn name(self) -> &'static str {
        match self {
            EntryField::Firstname => "firstname",
            EntryField::Lastname => "lastname",
            EntryField::Street => "street",
            EntryField::Number => "number",
            EntryField::PostalCode => "postal_code",
            EntryField::Place => "place",
            EntryField::Birthdate => "birthdate",
            EntryField::Phone => "phone",
            EntryField::Email => "email",
        }
    }

    /// Whether the field must be present on every entry.
    pub const fn is_required(self) -> bool {
        matches!(self, EntryField::Firstname | EntryField::Lastname)
    }
}

impl fmt::Display for EntryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntryField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// A single field assignment, applied through [`crate::Entry::with_updates`].
///
/// The value is raw text. An empty value clears an optional field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub field: EntryField,
    pub value: String,
}

impl FieldUpdate {
    pub fn new(field: EntryField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// Build an update from a field name, rejecting unknown names.
    pub fn parse(field: &str, value: impl Into<String>) -> Result<Self, UnknownField> {
        Ok(Self::new(field.parse()?, value))
    }

    /// Build an update that clears the field.
    pub fn clear(field: EntryField) -> Self {
        Self::new(field, String::new())
    }
}
