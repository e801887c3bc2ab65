//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::{Path, PathBuf};

use addrbook_core::Entry;
use chrono::{Datelike, NaiveDate};
use tempfile::TempDir;

/// A temporary directory that holds one test's storage files.
///
/// The directory and everything in it is removed on drop.
pub struct TestFixture {
    dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// A CSV file path in the fixture directory. The file does not exist yet.
    pub fn csv_path(&self) -> PathBuf {
        self.dir.path().join("book.csv")
    }

    /// A SQLite file path in the fixture directory.
    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("book.db")
    }

    /// Write `contents` to a file in the fixture directory and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("failed to write fixture file");
        path
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully populated entry.
pub fn jane_smith() -> Entry {
    Entry::builder("Jane", "Smith")
        .street("Baker Street")
        .number("221b")
        .postal_code(10115)
        .place("Berlin")
        .birthdate("1985-07-14")
        .phone("+49 30 123456")
        .email("jane.smith@example.com")
        .build()
        .expect("fixture entry is valid")
}

/// Entries with distinct identities, covering absent optional fields.
pub fn sample_entries() -> Vec<Entry> {
    let build = |builder: addrbook_core::EntryBuilder| builder.build().expect("fixture entry is valid");
    vec![
        jane_smith(),
        build(
            Entry::builder("John", "Smithson")
                .place("Hamburg")
                .email("john@smithson.org"),
        ),
        build(
            Entry::builder("Erika", "Mustermann")
                .street("Heidestrasse")
                .number("17")
                .postal_code("51147")
                .place("Köln")
                .birthdate("1964-08-12"),
        ),
        build(Entry::builder("Max", "Schmidt").phone("0176 5550123")),
        build(
            Entry::builder("Ana", "Smyth, Jr.")
                .street("Quote \"Lane\"")
                .email("ana@smyth.co.uk"),
        ),
    ]
}

/// Five entries, four of which have a birthday on `date`'s month and day.
///
/// Birth years are leap years so the set is valid when `date` is February 29.
pub fn birthday_entries(date: NaiveDate) -> Vec<Entry> {
    let born = |year: i32| {
        date.with_year(year)
            .expect("leap year accepts every month and day")
    };
    let other_day = date
        .succ_opt()
        .and_then(|d| d.with_year(1984))
        .expect("leap year accepts every month and day");

    let mut entries: Vec<Entry> = [1980, 1984, 1996, 2004]
        .into_iter()
        .enumerate()
        .map(|(i, year)| {
            Entry::builder(format!("Birthday{i}"), "Today")
                .birth_date(born(year))
                .build()
                .expect("fixture entry is valid")
        })
        .collect();
    entries.push(
        Entry::builder("Other", "Day")
            .birth_date(other_day)
            .build()
            .expect("fixture entry is valid"),
    );
    entries
}
