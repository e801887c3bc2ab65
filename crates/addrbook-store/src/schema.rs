//! Table setup for the SQLite store.
//!
//! One table holds every entry. It is created on open if absent; an existing
//! table is used as-is (there is no migration step).

use rusqlite::{Connection, OptionalExtension};

use addrbook_core::EntryField;

use crate::error::{Result, StoreError};

/// Default table name.
pub const DEFAULT_TABLE: &str = "AddressBook";

/// Whether `name` is a plain SQL identifier (letters, digits, underscore,
/// not starting with a digit).
///
/// Table names are interpolated into statements, so nothing else is allowed.
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check a table name, failing with `InvalidResource`.
pub fn check_table_name(name: &str) -> Result<()> {
    if is_valid_table_name(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidResource(format!(
            "invalid table name: {name:?}"
        )))
    }
}

/// Quote a (validated) identifier.
pub fn quote(name: &str) -> String {
    format!("\"{name}\"")
}

/// Comma-separated entry columns in field order, without `id`.
pub fn entry_columns() -> String {
    EntryField::ALL.map(EntryField::name).join(", ")
}

/// Create the entry table and its name index if they do not exist.
///
/// Idempotent.
pub fn ensure_table(conn: &Connection, table: &str) -> Result<()> {
    check_table_name(table)?;
    let quoted = quote(table);

    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {quoted} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            firstname TEXT NOT NULL,
            lastname TEXT NOT NULL,
            street TEXT,
            number TEXT,
            postal_code TEXT,
            place TEXT,
            birthdate TEXT,            -- ISO YYYY-MM-DD
            phone TEXT,
            email TEXT
        );

        -- Duplicate checks look entries up by name
        CREATE INDEX IF NOT EXISTS "idx_{table}_name" ON {quoted}(lastname, firstname);
        "#
    ))?;

    Ok(())
}

/// Whether `table` exists in the connected database.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
