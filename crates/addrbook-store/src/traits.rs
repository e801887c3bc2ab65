//! AddressStore trait: the abstract interface for entry persistence.
//!
//! Callers pick a backend at construction time and then talk only to this
//! trait. Implementations include a CSV file store and a SQLite store; both
//! must behave identically from the caller's point of view.

use std::collections::BTreeMap;
use std::path::Path;

use addrbook_core::{Entry, EntryField, EntryId, FieldUpdate};
use chrono::{Local, NaiveDate};

use crate::error::Result;
use crate::session::Session;

/// Entries keyed by id, in id order.
pub type EntryMap = BTreeMap<EntryId, Entry>;

/// Result of adding an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Entry was stored under a new id.
    Added(EntryId),
    /// An entry with the same firstname, lastname and email already exists.
    /// Nothing was stored and no id was consumed.
    Duplicate,
}

impl AddOutcome {
    /// Numeric code used by the text and JSON facades for duplicates.
    pub const DUPLICATE_CODE: i64 = -1;

    /// The new id, if the entry was stored.
    pub fn id(self) -> Option<EntryId> {
        match self {
            AddOutcome::Added(id) => Some(id),
            AddOutcome::Duplicate => None,
        }
    }

    pub fn is_duplicate(self) -> bool {
        matches!(self, AddOutcome::Duplicate)
    }

    /// The id as a number, or [`Self::DUPLICATE_CODE`].
    pub fn to_code(self) -> i64 {
        match self {
            AddOutcome::Added(id) => id.as_rowid(),
            AddOutcome::Duplicate => Self::DUPLICATE_CODE,
        }
    }
}

/// The AddressStore trait: synchronous interface for entry persistence.
///
/// # Lifecycle
///
/// `bind` a resource locator, `open` it, issue any sequence of operations,
/// `save` to persist, and `close`. Every operation other than `bind` and
/// `close` fails with `ResourceUnavailable` while the store is closed.
/// [`StoreExt::session`] and [`StoreExt::with_session`] pair open and close
/// on every exit path.
///
/// # Design Notes
///
/// - **Duplicates**: an entry whose firstname, lastname and email all equal a
///   stored entry's is rejected with [`AddOutcome::Duplicate`].
/// - **Search**: case-insensitive substring over one field, or over every
///   field when `field` is `None`.
/// - **Identity**: ids are positive and assigned by the backend. Whether they
///   survive a close/open cycle depends on the backend.
pub trait AddressStore {
    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Bind the store to a resource locator.
    ///
    /// Fails with `InvalidResource` before any I/O if the locator has the
    /// wrong shape for this backend. Rebinding closes any open session.
    fn bind(&mut self, locator: &Path) -> Result<()>;

    /// The bound locator, if any.
    fn locator(&self) -> Option<&Path>;

    /// Open the bound resource, creating it if needed.
    ///
    /// Opening an already-open store reopens it.
    fn open(&mut self) -> Result<()>;

    /// Release handles and memory. Never fails; problems are logged.
    fn close(&mut self);

    /// Whether the store is open.
    fn is_open(&self) -> bool;

    /// Durably persist the current state.
    fn save(&mut self) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Entry Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add an entry, or report it as a duplicate.
    fn add(&mut self, entry: Entry) -> Result<AddOutcome>;

    /// Get an entry by id.
    fn get(&self, id: EntryId) -> Result<Option<Entry>>;

    /// Snapshot of every stored entry.
    fn get_all(&self) -> Result<EntryMap>;

    /// Entries whose `field` (or any field, for `None`) contains `query`,
    /// ignoring ASCII case.
    fn search(&self, field: Option<EntryField>, query: &str) -> Result<EntryMap>;

    /// Apply field updates to a stored entry.
    ///
    /// Fails with `NotFound` if the id is not stored, or `Validation` if a new
    /// value is invalid. Either way the stored entry is unchanged.
    fn update(&mut self, id: EntryId, updates: &[FieldUpdate]) -> Result<EntryId>;

    /// Delete an entry. Returns the id if something was deleted.
    fn delete(&mut self, id: EntryId) -> Result<Option<EntryId>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Birthday Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Entries whose birthdate has the same month and day as `date`.
    fn birthdays_on(&self, date: NaiveDate) -> Result<EntryMap>;

    /// Entries with a birthday today (local time).
    fn get_todays_birthdays(&self) -> Result<EntryMap> {
        self.birthdays_on(Local::now().date_naive())
    }

    /// Number of stored entries.
    fn len(&self) -> Result<usize> {
        Ok(self.get_all()?.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<S: AddressStore + ?Sized> AddressStore for Box<S> {
    fn bind(&mut self, locator: &Path) -> Result<()> {
        (**self).bind(locator)
    }

    fn locator(&self) -> Option<&Path> {
        (**self).locator()
    }

    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn save(&mut self) -> Result<()> {
        (**self).save()
    }

    fn add(&mut self, entry: Entry) -> Result<AddOutcome> {
        (**self).add(entry)
    }

    fn get(&self, id: EntryId) -> Result<Option<Entry>> {
        (**self).get(id)
    }

    fn get_all(&self) -> Result<EntryMap> {
        (**self).get_all()
    }

    fn search(&self, field: Option<EntryField>, query: &str) -> Result<EntryMap> {
        (**self).search(field, query)
    }

    fn update(&mut self, id: EntryId, updates: &[FieldUpdate]) -> Result<EntryId> {
        (**self).update(id, updates)
    }

    fn delete(&mut self, id: EntryId) -> Result<Option<EntryId>> {
        (**self).delete(id)
    }

    fn birthdays_on(&self, date: NaiveDate) -> Result<EntryMap> {
        (**self).birthdays_on(date)
    }

    fn get_todays_birthdays(&self) -> Result<EntryMap> {
        (**self).get_todays_birthdays()
    }

    fn len(&self) -> Result<usize> {
        (**self).len()
    }
}

/// Extension trait for common store patterns.
pub trait StoreExt: AddressStore {
    /// Search by field name. An empty name searches every field.
    ///
    /// Unknown names fail with `InvalidField`.
    fn search_by_name(&self, field: &str, query: &str) -> Result<EntryMap> {
        let field = if field.is_empty() {
            None
        } else {
            Some(field.parse::<EntryField>()?)
        };
        self.search(field, query)
    }

    /// Update from `(field name, value)` pairs.
    ///
    /// Every name is checked before anything is written.
    fn update_by_name(&mut self, id: EntryId, pairs: &[(&str, &str)]) -> Result<EntryId> {
        let updates = pairs
            .iter()
            .map(|(field, value)| FieldUpdate::parse(field, *value))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.update(id, &updates)
    }

    /// All entries in display order (the entry ordering, not id order).
    fn sorted_entries(&self) -> Result<Vec<(EntryId, Entry)>> {
        let mut entries: Vec<_> = self.get_all()?.into_iter().collect();
        entries.sort_by(|(a_id, a), (b_id, b)| a.cmp(b).then(a_id.cmp(b_id)));
        Ok(entries)
    }

    /// Open the store and return a guard that closes it when dropped.
    fn session(&mut self) -> Result<Session<'_, Self>> {
        Session::open(self)
    }

    /// Open, run `f`, save if `f` succeeded, and close on every path.
    fn with_session<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mut session = self.session()?;
        let value = f(&mut *session)?;
        session.save()?;
        Ok(value)
    }
}

impl<S: AddressStore + ?Sized> StoreExt for S {}
