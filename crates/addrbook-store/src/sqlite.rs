//! SQLite implementation of the AddressStore trait.
//!
//! Entries live in a single table. Each operation is translated into one
//! parameterized statement against that table (update reads the row first so
//! the new values can be validated). Ids come from SQLite's AUTOINCREMENT
//! rowid and survive close/open cycles.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use addrbook_core::{Entry, EntryDraft, EntryField, EntryId, FieldUpdate};
use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Params};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::schema::{self, DEFAULT_TABLE};
use crate::traits::{AddOutcome, AddressStore, EntryMap};

/// File extensions accepted by [`SqliteStore::bind`], compared case-insensitively.
pub const DB_SUFFIXES: &[&str] = &["db", "sqlite", "sqlite3", "db3"];

const MEMORY_LOCATOR: &str = ":memory:";

#[derive(Debug, Clone)]
enum Target {
    File(PathBuf),
    Memory(PathBuf),
}

impl Target {
    fn path(&self) -> &Path {
        match self {
            Target::File(path) | Target::Memory(path) => path,
        }
    }
}

/// SQLite-based store implementation.
///
/// Holds a live connection while open. The connection runs in autocommit
/// mode, so each statement is durable when it returns; `save` commits any
/// transaction a caller may have started on the same database.
pub struct SqliteStore {
    target: Option<Target>,
    table: String,
    conn: Option<Connection>,
}

impl SqliteStore {
    /// Create an unbound store using the default table.
    pub fn new() -> Self {
        Self {
            target: None,
            table: DEFAULT_TABLE.to_string(),
            conn: None,
        }
    }

    /// Create a store bound to the database file at `path`.
    pub fn at(path: impl AsRef<Path>) -> Result<Self> {
        let mut store = Self::new();
        store.bind(path.as_ref())?;
        Ok(store)
    }

    /// Create a store backed by a private in-memory database.
    ///
    /// Useful for testing. Contents are lost on close.
    pub fn in_memory() -> Self {
        Self {
            target: Some(Target::Memory(PathBuf::from(MEMORY_LOCATOR))),
            ..Self::new()
        }
    }

    /// Use `table` instead of the default table name.
    pub fn with_table(mut self, table: &str) -> Result<Self> {
        schema::check_table_name(table)?;
        self.table = table.to_string();
        Ok(self)
    }

    /// The table this store reads and writes.
    pub fn table(&self) -> &str {
        &self.table
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(StoreError::not_open)
    }

    fn select_sql(&self, filter: &str) -> String {
        format!(
            "SELECT id, {} FROM {} {filter}",
            schema::entry_columns(),
            schema::quote(&self.table)
        )
    }

    /// Run a SELECT built by [`Self::select_sql`] and collect valid entries.
    fn query_entries<P: Params>(&self, sql: &str, params: P) -> Result<EntryMap> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, row_to_draft)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut entries = EntryMap::new();
        for (rowid, draft) in rows {
            if let Some((id, entry)) = validate_row(rowid, draft) {
                entries.insert(id, entry);
            }
        }
        Ok(entries)
    }

    /// Whether a stored row that validates has the same identity as `entry`.
    ///
    /// Rows that fail validation are invisible to reads, so they do not block
    /// an add either.
    fn is_duplicate(&self, entry: &Entry) -> Result<bool> {
        let sql = self.select_sql("WHERE firstname = ?1 AND lastname = ?2 AND email IS ?3");
        let matches = self.query_entries(
            &sql,
            params![entry.firstname(), entry.lastname(), entry.email()],
        )?;
        Ok(!matches.is_empty())
    }
}

impl Default for SqliteStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `path` ends in one of [`DB_SUFFIXES`].
pub fn has_db_suffix(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DB_SUFFIXES.iter().any(|s| ext.eq_ignore_ascii_case(s)))
}

// Read a column as text whatever its storage class. Tables written by other
// tools may hold integers in text columns.
fn column_text(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    })
}

// Helper to convert a row to (rowid, draft)
fn row_to_draft(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, EntryDraft)> {
    let rowid: i64 = row.get(0)?;
    let mut draft = EntryDraft::default();
    for (offset, field) in EntryField::ALL.into_iter().enumerate() {
        if let Some(value) = column_text(row, offset + 1)? {
            draft.set(field, value);
        }
    }
    Ok((rowid, draft))
}

fn validate_row(rowid: i64, draft: EntryDraft) -> Option<(EntryId, Entry)> {
    let Some(id) = EntryId::from_rowid(rowid) else {
        warn!(rowid, "skipping row with non-positive id");
        return None;
    };
    match Entry::try_from(draft) {
        Ok(entry) => Some((id, entry)),
        Err(e) => {
            warn!(id = %id, error = %e, "skipping invalid row");
            None
        }
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl AddressStore for SqliteStore {
    fn bind(&mut self, locator: &Path) -> Result<()> {
        if !has_db_suffix(locator) {
            return Err(StoreError::InvalidResource(format!(
                "{} does not end in a database suffix (expected one of: {})",
                locator.display(),
                DB_SUFFIXES.join(", ")
            )));
        }
        if self.is_open() {
            debug!("rebinding open SQLite store; closing current connection");
            self.close();
        }
        self.target = Some(Target::File(locator.to_path_buf()));
        Ok(())
    }

    fn locator(&self) -> Option<&Path> {
        self.target.as_ref().map(Target::path)
    }

    fn open(&mut self) -> Result<()> {
        let target = self.target.clone().ok_or_else(StoreError::unbound)?;
        if self.is_open() {
            self.close();
        }

        let conn = match &target {
            Target::File(path) => Connection::open(path)?,
            Target::Memory(_) => Connection::open_in_memory()?,
        };
        schema::ensure_table(&conn, &self.table)?;

        info!(locator = %target.path().display(), table = %self.table, "opened SQLite address book");
        self.conn = Some(conn);
        Ok(())
    }

    fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if let Err((_, e)) = conn.close() {
            warn!(error = %e, "error closing SQLite connection");
        } else {
            debug!(locator = ?self.locator(), "SQLite store closed");
        }
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn save(&mut self) -> Result<()> {
        let conn = self.conn()?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
            debug!("committed open transaction");
        }
        Ok(())
    }

    fn add(&mut self, entry: Entry) -> Result<AddOutcome> {
        if self.is_duplicate(&entry)? {
            debug!(
                firstname = entry.firstname(),
                lastname = entry.lastname(),
                "rejecting duplicate entry"
            );
            return Ok(AddOutcome::Duplicate);
        }

        let placeholders: Vec<String> = (1..=EntryField::ALL.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema::quote(&self.table),
            schema::entry_columns(),
            placeholders.join(", ")
        );
        let values = EntryField::ALL.map(|field| entry.field_text(field));

        let conn = self.conn()?;
        conn.execute(&sql, params_from_iter(values.iter()))?;

        let rowid = conn.last_insert_rowid();
        let id = EntryId::from_rowid(rowid).ok_or_else(|| {
            StoreError::ResourceUnavailable(format!("database returned invalid rowid {rowid}"))
        })?;
        Ok(AddOutcome::Added(id))
    }

    fn get(&self, id: EntryId) -> Result<Option<Entry>> {
        let sql = self.select_sql("WHERE id = ?1");
        let row = self
            .conn()?
            .query_row(&sql, [id.as_rowid()], row_to_draft)
            .optional()?;
        Ok(row.and_then(|(rowid, draft)| validate_row(rowid, draft)).map(|(_, entry)| entry))
    }

    fn get_all(&self) -> Result<EntryMap> {
        self.query_entries(&self.select_sql("ORDER BY id"), [])
    }

    fn search(&self, field: Option<EntryField>, query: &str) -> Result<EntryMap> {
        let condition = |f: EntryField| format!("{} LIKE ?1 ESCAPE '\\'", f.name());
        let filter = match field {
            Some(f) => condition(f),
            None => EntryField::ALL.map(condition).join(" OR "),
        };
        let sql = self.select_sql(&format!("WHERE {filter} ORDER BY id"));
        self.query_entries(&sql, [like_pattern(query)])
    }

    fn update(&mut self, id: EntryId, updates: &[FieldUpdate]) -> Result<EntryId> {
        let current = self.get(id)?.ok_or(StoreError::NotFound(id))?;
        let updated = current.with_updates(updates)?;

        let fields: BTreeSet<EntryField> = updates.iter().map(|u| u.field).collect();
        if fields.is_empty() {
            return Ok(id);
        }

        let assignments: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{} = ?{}", f.name(), i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            schema::quote(&self.table),
            assignments.join(", "),
            fields.len() + 1
        );

        let mut values: Vec<rusqlite::types::Value> = fields
            .iter()
            .map(|f| updated.field_text(*f).into())
            .collect();
        values.push(id.as_rowid().into());

        let changed = self.conn()?.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(id)
    }

    fn delete(&mut self, id: EntryId) -> Result<Option<EntryId>> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", schema::quote(&self.table));
        let deleted = self.conn()?.execute(&sql, [id.as_rowid()])?;
        Ok((deleted > 0).then_some(id))
    }

    fn birthdays_on(&self, date: NaiveDate) -> Result<EntryMap> {
        let sql = self.select_sql("WHERE substr(birthdate, 6, 5) = ?1 ORDER BY id");
        self.query_entries(&sql, [date.format("%m-%d").to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(first: &str, last: &str, email: &str) -> Entry {
        Entry::builder(first, last).email(email).build().unwrap()
    }

    fn open_memory() -> SqliteStore {
        let mut store = SqliteStore::in_memory();
        store.open().unwrap();
        store
    }

    #[test]
    fn test_bind_requires_db_suffix() {
        let mut store = SqliteStore::new();
        for bad in ["book.csv", "book", "book.db.bak", "dir/"] {
            assert!(
                matches!(store.bind(Path::new(bad)), Err(StoreError::InvalidResource(_))),
                "{bad:?} should be rejected"
            );
        }
        for good in ["book.db", "BOOK.DB", "book.sqlite", "x/y.sqlite3", "z.db3"] {
            store.bind(Path::new(good)).unwrap();
        }
    }

    #[test]
    fn test_bind_does_no_io() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("book.db");
        let store = SqliteStore::at(&path).unwrap();
        assert!(!store.is_open());
        assert!(!path.exists());
    }

    #[test]
    fn test_open_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.db");
        let mut store = SqliteStore::at(&path).unwrap();
        store.open().unwrap();
        assert!(path.exists());
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_open_unbound_fails() {
        let mut store = SqliteStore::new();
        assert!(matches!(store.open(), Err(StoreError::ResourceUnavailable(_))));
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let mut store = SqliteStore::at(dir.path().join("missing").join("book.db")).unwrap();
        assert!(matches!(store.open(), Err(StoreError::ResourceUnavailable(_))));
    }

    #[test]
    fn test_add_and_get() {
        let mut store = open_memory();
        let jane = Entry::builder("Jane", "Doe")
            .street("Main St")
            .number("5b")
            .postal_code(10115)
            .place("Berlin")
            .birthdate("1990-04-01")
            .phone("+49 30 1234")
            .email("jane@example.com")
            .build()
            .unwrap();

        let id = store.add(jane.clone()).unwrap().id().unwrap();
        assert_eq!(store.get(id).unwrap(), Some(jane));
        assert_eq!(store.get(id.next()).unwrap(), None);
    }

    #[test]
    fn test_duplicate_consumes_no_id() {
        let mut store = open_memory();
        let first = store.add(entry("Jane", "Doe", "jane@example.com")).unwrap();
        assert_eq!(first, AddOutcome::Added(EntryId::FIRST));

        let dup = Entry::builder("Jane", "Doe")
            .place("Elsewhere")
            .email("jane@example.com")
            .build()
            .unwrap();
        assert_eq!(store.add(dup).unwrap(), AddOutcome::Duplicate);

        let next = store.add(entry("John", "Doe", "john@example.com")).unwrap();
        assert_eq!(next.id().unwrap().get(), 2);
    }

    #[test]
    fn test_duplicate_without_email() {
        let mut store = open_memory();
        store.add(Entry::builder("A", "B").build().unwrap()).unwrap();
        let again = store.add(Entry::builder("A", "B").phone("1").build().unwrap()).unwrap();
        assert!(again.is_duplicate());
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let mut store = open_memory();
        store.add(Entry::builder("Percy", "100%").build().unwrap()).unwrap();
        store.add(Entry::builder("Under", "a_b").build().unwrap()).unwrap();
        store.add(Entry::builder("Plain", "axb").build().unwrap()).unwrap();

        assert_eq!(store.search(Some(EntryField::Lastname), "0%").unwrap().len(), 1);
        assert_eq!(store.search(Some(EntryField::Lastname), "a_b").unwrap().len(), 1);
        assert_eq!(store.search(Some(EntryField::Lastname), "%").unwrap().len(), 1);
    }

    #[test]
    fn test_update_writes_only_changed_columns() {
        let mut store = open_memory();
        let id = store.add(entry("Jane", "Doe", "jane@example.com")).unwrap().id().unwrap();

        store
            .update(id, &[FieldUpdate::new(EntryField::PostalCode, "01067")])
            .unwrap();
        let stored: Option<String> = store
            .conn()
            .unwrap()
            .query_row("SELECT postal_code FROM AddressBook WHERE id = ?1", [id.as_rowid()], |row| row.get(0))
            .unwrap();
        assert_eq!(stored.as_deref(), Some("1067"));
        assert_eq!(store.get(id).unwrap().unwrap().email(), Some("jane@example.com"));
    }

    #[test]
    fn test_update_missing_and_invalid() {
        let mut store = open_memory();
        let missing = EntryId::new(99).unwrap();
        assert!(matches!(
            store.update(missing, &[FieldUpdate::new(EntryField::Place, "X")]),
            Err(StoreError::NotFound(id)) if id == missing
        ));

        let id = store.add(entry("Jane", "Doe", "jane@example.com")).unwrap().id().unwrap();
        assert!(matches!(
            store.update(id, &[FieldUpdate::new(EntryField::Email, "broken")]),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(store.get(id).unwrap().unwrap().email(), Some("jane@example.com"));
    }

    #[test]
    fn test_delete_missing_returns_none() {
        let mut store = open_memory();
        assert_eq!(store.delete(EntryId::FIRST).unwrap(), None);
    }

    #[test]
    fn test_ids_survive_reopen_and_are_not_reused() {
        let dir = TempDir::new().unwrap();
        let mut store = SqliteStore::at(dir.path().join("book.db")).unwrap();
        store.open().unwrap();
        let a = store.add(entry("A", "One", "a1@example.com")).unwrap().id().unwrap();
        let b = store.add(entry("A", "Two", "a2@example.com")).unwrap().id().unwrap();
        store.delete(b).unwrap();
        store.save().unwrap();
        store.close();

        store.open().unwrap();
        assert!(store.get(a).unwrap().is_some());
        let c = store.add(entry("A", "Three", "a3@example.com")).unwrap().id().unwrap();
        assert_eq!(c.get(), 3);
    }

    #[test]
    fn test_save_commits_open_transaction() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.db");
        let mut store = SqliteStore::at(&path).unwrap();
        store.open().unwrap();
        store.conn().unwrap().execute_batch("BEGIN").unwrap();
        store.add(entry("A", "One", "a1@example.com")).unwrap();
        store.save().unwrap();
        store.close();

        store.open().unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_reads_foreign_column_types() {
        let mut store = open_memory();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO AddressBook (firstname, lastname, number, postal_code) VALUES ('A', 'B', 12, 34567)",
                [],
            )
            .unwrap();
        let all = store.get_all().unwrap();
        let entry = all.values().next().unwrap();
        assert_eq!(entry.number(), Some("12"));
        assert_eq!(entry.postal_code(), Some(34567));
    }

    #[test]
    fn test_invalid_rows_are_skipped() {
        let mut store = open_memory();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO AddressBook (firstname, lastname, birthdate) VALUES ('A', 'B', 'someday')",
                [],
            )
            .unwrap();
        store.add(entry("C", "D", "c@example.com")).unwrap();
        assert_eq!(store.get_all().unwrap().len(), 1);
        assert_eq!(store.get(EntryId::FIRST).unwrap(), None);
    }

    #[test]
    fn test_invalid_row_does_not_block_add_or_count() {
        let mut store = open_memory();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO AddressBook (firstname, lastname, birthdate, email) \
                 VALUES ('A', 'B', 'bad', 'a@example.com')",
                [],
            )
            .unwrap();
        assert_eq!(store.len().unwrap(), 0);
        assert_eq!(store.len().unwrap(), store.get_all().unwrap().len());

        let outcome = store.add(entry("A", "B", "a@example.com")).unwrap();
        let id = outcome.id().expect("invalid row must not count as a duplicate");
        assert_eq!(store.get(id).unwrap().unwrap().email(), Some("a@example.com"));
        assert_eq!(store.len().unwrap(), 1);

        assert!(store.add(entry("A", "B", "a@example.com")).unwrap().is_duplicate());
    }

    #[test]
    fn test_custom_table() {
        let mut store = SqliteStore::in_memory().with_table("contacts").unwrap();
        store.open().unwrap();
        store.add(entry("A", "B", "a@example.com")).unwrap();
        assert!(schema::table_exists(store.conn().unwrap(), "contacts").unwrap());
        assert!(!schema::table_exists(store.conn().unwrap(), DEFAULT_TABLE).unwrap());

        assert!(matches!(
            SqliteStore::new().with_table("bad name"),
            Err(StoreError::InvalidResource(_))
        ));
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("smith"), "%smith%");
        assert_eq!(like_pattern("50%_\\"), "%50\\%\\_\\\\%");
    }
}
