//! The AddressBook: one open store behind a string-friendly API.
//!
//! This is the layer a text menu or an HTTP handler talks to. It picks the
//! backend from a [`BookConfig`], keeps the store open for its lifetime and
//! accepts field names as strings, turning every failure into a
//! [`BookError`] with an HTTP status.

use addrbook_core::{Entry, EntryDraft, EntryField, EntryId, FieldUpdate};
use addrbook_store::{
    AddOutcome, AddressStore, CsvStore, EntryMap, SqliteStore, StoreError, StoreExt,
};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::{BackendKind, BookConfig};
use crate::error::Result;

/// Build an unopened store for `config`, bound to its path.
pub fn build_store(config: &BookConfig) -> Result<Box<dyn AddressStore>> {
    let mut store: Box<dyn AddressStore> = match config.resolved_backend()? {
        BackendKind::Csv => Box::new(CsvStore::new().with_id_column(config.csv_write_ids)),
        BackendKind::Sqlite => Box::new(SqliteStore::new().with_table(&config.table)?),
    };
    store.bind(&config.path)?;
    Ok(store)
}

/// An open address book.
///
/// The store is closed when the book is dropped. With `autosave` on (the
/// default) every successful add, update and delete is saved immediately;
/// otherwise call [`AddressBook::save`].
pub struct AddressBook {
    store: Box<dyn AddressStore>,
    config: BookConfig,
}

impl AddressBook {
    /// Select the backend for `config`, bind it and open it.
    pub fn open(config: BookConfig) -> Result<Self> {
        let store = build_store(&config)?;
        Self::with_store(store, config)
    }

    /// Wrap an already-bound store. The store is opened if it is not open.
    pub fn with_store(mut store: Box<dyn AddressStore>, config: BookConfig) -> Result<Self> {
        if !store.is_open() {
            store.open()?;
        }
        info!(path = %config.path.display(), autosave = config.autosave, "address book ready");
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> &dyn AddressStore {
        self.store.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entry Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a validated entry.
    pub fn add(&mut self, entry: Entry) -> Result<AddOutcome> {
        let outcome = self.store.add(entry)?;
        match outcome {
            AddOutcome::Added(id) => {
                debug!(%id, "entry added");
                self.autosave()?;
            }
            AddOutcome::Duplicate => debug!("duplicate entry not added"),
        }
        Ok(outcome)
    }

    /// Validate raw input and add it.
    pub fn add_draft(&mut self, draft: EntryDraft) -> Result<AddOutcome> {
        let entry = Entry::try_from(draft)?;
        self.add(entry)
    }

    /// Get an entry, failing with `NotFound` if the id is not stored.
    pub fn get(&self, id: EntryId) -> Result<Entry> {
        Ok(self.store.get(id)?.ok_or(StoreError::NotFound(id))?)
    }

    pub fn get_all(&self) -> Result<EntryMap> {
        Ok(self.store.get_all()?)
    }

    /// All entries in display order.
    pub fn sorted(&self) -> Result<Vec<(EntryId, Entry)>> {
        Ok(self.store.sorted_entries()?)
    }

    /// Search one field by name, or every field when `field` is empty.
    pub fn search(&self, field: &str, query: &str) -> Result<EntryMap> {
        Ok(self.store.search_by_name(field, query)?)
    }

    /// Search with a typed field.
    pub fn search_field(&self, field: Option<EntryField>, query: &str) -> Result<EntryMap> {
        Ok(self.store.search(field, query)?)
    }

    /// Update from `(field name, value)` pairs. An empty value clears the field.
    pub fn update(&mut self, id: EntryId, pairs: &[(&str, &str)]) -> Result<EntryId> {
        let id = self.store.update_by_name(id, pairs)?;
        debug!(%id, fields = pairs.len(), "entry updated");
        self.autosave()?;
        Ok(id)
    }

    /// Update with typed field updates.
    pub fn apply(&mut self, id: EntryId, updates: &[FieldUpdate]) -> Result<EntryId> {
        let id = self.store.update(id, updates)?;
        debug!(%id, fields = updates.len(), "entry updated");
        self.autosave()?;
        Ok(id)
    }

    /// Replace every field of an entry with `draft`.
    ///
    /// Fields missing from the draft are cleared.
    pub fn replace(&mut self, id: EntryId, draft: EntryDraft) -> Result<EntryId> {
        let entry = Entry::try_from(draft)?;
        let updates: Vec<FieldUpdate> = EntryField::ALL
            .into_iter()
            .map(|field| FieldUpdate::new(field, entry.field_text(field).unwrap_or_default()))
            .collect();
        self.apply(id, &updates)
    }

    /// Delete an entry, failing with `NotFound` if the id is not stored.
    pub fn delete(&mut self, id: EntryId) -> Result<EntryId> {
        let deleted = self.store.delete(id)?.ok_or(StoreError::NotFound(id))?;
        debug!(id = %deleted, "entry deleted");
        self.autosave()?;
        Ok(deleted)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Birthdays
    // ─────────────────────────────────────────────────────────────────────────

    pub fn todays_birthdays(&self) -> Result<EntryMap> {
        Ok(self.store.get_todays_birthdays()?)
    }

    pub fn birthdays_on(&self, date: NaiveDate) -> Result<EntryMap> {
        Ok(self.store.birthdays_on(date)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    pub fn len(&self) -> Result<usize> {
        Ok(self.store.len()?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.store.is_empty()?)
    }

    pub fn save(&mut self) -> Result<()> {
        Ok(self.store.save()?)
    }

    /// Save and close, returning the store for reuse.
    pub fn close(mut self) -> Result<Box<dyn AddressStore>> {
        self.store.save()?;
        self.store.close();
        // Swap in a closed placeholder so Drop has nothing left to close.
        let store = std::mem::replace(&mut self.store, Box::new(CsvStore::new()));
        Ok(store)
    }

    fn autosave(&mut self) -> Result<()> {
        if self.config.autosave {
            self.store.save()?;
        }
        Ok(())
    }
}

impl Drop for AddressBook {
    fn drop(&mut self) {
        self.store.close();
    }
}
