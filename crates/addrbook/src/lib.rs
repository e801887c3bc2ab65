//! # Address Book
//!
//! The unified API for the address book: validated contact entries persisted
//! to a CSV file or a SQLite database behind one interface.
//!
//! ## Overview
//!
//! - **Entries**: validated contact records (`addrbook::core`)
//! - **Stores**: the `AddressStore` trait with CSV and SQLite backends (`addrbook::store`)
//! - **AddressBook**: an open store selected from a [`BookConfig`], taking
//!   field names as strings and reporting errors with HTTP status codes
//!
//! ## Usage
//!
//! ```rust,no_run
//! use addrbook::{AddressBook, BookConfig};
//! use addrbook::core::Entry;
//!
//! fn example() -> addrbook::Result<()> {
//!     addrbook::init_tracing();
//!
//!     // The backend is picked from the extension: .csv or .db/.sqlite
//!     let mut book = AddressBook::open(BookConfig::for_path("contacts.db"))?;
//!
//!     let entry = Entry::builder("Jane", "Smith")
//!         .birthdate("1990-04-01")
//!         .email("jane@example.com")
//!         .build()?;
//!     let id = book.add(entry)?;
//!     println!("added: {id:?}");
//!
//!     for (id, entry) in book.search("lastname", "smith")? {
//!         println!("{id}: {entry}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `addrbook::core` - Entries, field tags and validation
//! - `addrbook::store` - Storage trait and backends

pub mod book;
pub mod config;
pub mod error;
pub mod logging;

// Re-export component crates
pub use addrbook_core as core;
pub use addrbook_store as store;

// Re-export main types for convenience
pub use book::{build_store, AddressBook};
pub use config::{BackendKind, BookConfig};
pub use error::{BookError, Result};
pub use logging::{init_tracing, init_tracing_with};

// Re-export commonly used component types
pub use addrbook_core::{Entry, EntryDraft, EntryField, EntryId, FieldUpdate, ValidationError};
pub use addrbook_store::{AddOutcome, AddressStore, CsvStore, SqliteStore, StoreError, StoreExt};
