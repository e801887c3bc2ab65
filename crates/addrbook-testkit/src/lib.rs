//! # Address Book Testkit
//!
//! Testing utilities for the address book.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Conformance checks**: One behavior contract, run against every backend
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Temporary storage locations and sample entries
//!
//! ## Conformance Suite
//!
//! Run every check against a backend from an integration test:
//!
//! ```rust,ignore
//! use std::path::Path;
//! use addrbook_store::CsvStore;
//!
//! addrbook_testkit::conformance_suite!(csv, |dir: &Path| {
//!     CsvStore::at(dir.join("book.csv")).unwrap()
//! });
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use addrbook_testkit::generators::{entry_from_params, EntryParams};
//!
//! proptest! {
//!     #[test]
//!     fn entry_matches_its_own_lastname(params: EntryParams) {
//!         let entry = entry_from_params(&params);
//!         prop_assert!(entry.matches(None, entry.lastname()));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use addrbook_testkit::fixtures::{sample_entries, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let path = fixture.csv_path();
//! assert!(!path.exists());
//! assert_eq!(sample_entries().len(), 5);
//! ```

pub mod conformance;
pub mod fixtures;
pub mod generators;

pub use fixtures::{birthday_entries, jane_smith, sample_entries, TestFixture};
pub use generators::{distinct_entries, entry, entry_from_params, EntryParams};
