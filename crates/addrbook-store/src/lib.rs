//! # Address Book Store
//!
//! Storage abstraction for the address book. Provides a trait-based interface
//! for entry persistence with CSV file and SQLite implementations.
//!
//! ## Overview
//!
//! Callers talk to the [`AddressStore`] trait and never to a backend's file
//! format or connection. [`CsvStore`] keeps the whole book in memory and
//! rewrites the file on save; [`SqliteStore`] executes each operation
//! against a table.
//!
//! ## Key Types
//!
//! - [`AddressStore`] - The trait for all storage operations
//! - [`CsvStore`] - Flat CSV file storage
//! - [`SqliteStore`] - SQLite database storage
//! - [`AddOutcome`] - Result of adding an entry
//! - [`Session`] - Open store that closes itself on drop
//!
//! ## Usage
//!
//! ```rust,no_run
//! use addrbook_core::{Entry, EntryField};
//! use addrbook_store::{AddressStore, SqliteStore, StoreExt};
//!
//! fn example() -> addrbook_store::Result<()> {
//!     let mut store = SqliteStore::at("book.db")?;
//!
//!     store.with_session(|store| {
//!         let entry = Entry::builder("Jane", "Doe").build()?;
//!         let outcome = store.add(entry)?;
//!         let smiths = store.search(Some(EntryField::Lastname), "smith")?;
//!         println!("{outcome:?}, {} matches", smiths.len());
//!         Ok(())
//!     })
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Duplicates**: same firstname, lastname and email is rejected, not an error
//! - **Closed stores**: every data operation fails with `ResourceUnavailable`
//! - **Ids**: CSV renumbers from 1 on every open; SQLite ids are persistent

pub mod csv_store;
pub mod error;
pub mod schema;
pub mod session;
pub mod sqlite;
pub mod traits;

pub use csv_store::CsvStore;
pub use error::{Result, StoreError};
pub use session::Session;
pub use sqlite::SqliteStore;
pub use traits::{AddOutcome, AddressStore, EntryMap, StoreExt};
