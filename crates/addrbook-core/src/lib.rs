//! # Address Book Core
//!
//! Pure primitives for the address book: entries, field tags and validation.
//!
//! This crate contains no I/O and no storage. It defines what a valid entry
//! is; the storage crate decides where entries live.
//!
//! ## Key Types
//!
//! - [`Entry`] - A validated contact record with a total display ordering
//! - [`EntryDraft`] - Raw, unvalidated entry input
//! - [`EntryId`] - Backend-assigned positive identifier
//! - [`EntryField`] - The closed set of field names
//! - [`FieldUpdate`] - A typed field assignment for updates
//!
//! ## Validation
//!
//! An entry is fully valid or it does not exist. See [`validation`] for the
//! per-field rules.

pub mod entry;
pub mod error;
pub mod field;
pub mod types;
pub mod validation;

pub use entry::{Entry, EntryBuilder, EntryDraft};
pub use error::{UnknownField, ValidationError};
pub use field::{EntryField, FieldUpdate};
pub use types::EntryId;
