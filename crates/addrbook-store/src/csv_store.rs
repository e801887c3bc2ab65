//! CSV file implementation of the AddressStore trait.
//!
//! The whole file is loaded into an id-keyed map on `open`, mutated in
//! memory, and rewritten in full on `save`. Nothing touches the file between
//! those two points.
//!
//! Ids are the 1-based data row position in the file, reassigned on every
//! load, so an id only identifies a row within one open/close session. A row
//! that fails to load leaves a gap in the ids.

use std::path::{Path, PathBuf};

use addrbook_core::{Entry, EntryDraft, EntryField, EntryId, FieldUpdate};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::traits::{AddOutcome, AddressStore, EntryMap};

/// Header of the optional leading id column.
pub const ID_COLUMN: &str = "id";

/// CSV-backed store.
#[derive(Debug, Default)]
pub struct CsvStore {
    path: Option<PathBuf>,
    /// Loaded entries; `None` while closed.
    state: Option<CsvState>,
    write_ids: bool,
}

#[derive(Debug)]
struct CsvState {
    entries: EntryMap,
    /// Highest id handed out this session. Deleted ids are not reused.
    high_water: Option<EntryId>,
}

impl CsvState {
    fn next_id(&self) -> EntryId {
        let max_stored = self.entries.last_key_value().map(|(id, _)| *id);
        max_stored
            .max(self.high_water)
            .map_or(EntryId::FIRST, EntryId::next)
    }
}

impl CsvStore {
    /// Create an unbound store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store bound to `path`.
    pub fn at(path: impl AsRef<Path>) -> Result<Self> {
        let mut store = Self::new();
        store.bind(path.as_ref())?;
        Ok(store)
    }

    /// Also write a leading `id` column on save.
    ///
    /// The column is informational: ids are reassigned on every load.
    pub fn with_id_column(mut self, write_ids: bool) -> Self {
        self.write_ids = write_ids;
        self
    }

    fn path(&self) -> Result<&Path> {
        self.path.as_deref().ok_or_else(StoreError::unbound)
    }

    fn state(&self) -> Result<&CsvState> {
        self.state.as_ref().ok_or_else(StoreError::not_open)
    }

    fn state_mut(&mut self) -> Result<&mut CsvState> {
        self.state.as_mut().ok_or_else(StoreError::not_open)
    }

    fn filtered(&self, keep: impl Fn(&Entry) -> bool) -> Result<EntryMap> {
        Ok(self
            .state()?
            .entries
            .iter()
            .filter(|(_, entry)| keep(entry))
            .map(|(id, entry)| (*id, entry.clone()))
            .collect())
    }
}

/// Read every valid row of the file at `path`.
///
/// Rows that fail decoding or validation are skipped with a warning. Only
/// I/O failures abort the load.
fn load_entries(path: &Path) -> Result<EntryMap> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers);
    if columns.missing_required() {
        warn!(path = %path.display(), "CSV header lacks firstname/lastname; no rows will load");
    }

    let mut entries = EntryMap::new();
    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!(row, error = %e, "skipping undecodable CSV row");
                continue;
            }
        };

        // Data row N gets id N; a skipped row leaves a gap.
        let Some(id) = EntryId::new(row as u64) else {
            continue;
        };
        match Entry::try_from(columns.draft(&record)) {
            Ok(entry) => {
                entries.insert(id, entry);
            }
            Err(e) => warn!(row, error = %e, "skipping invalid CSV row"),
        }
    }

    Ok(entries)
}

/// Write a header and every entry to a fresh file at `path`.
fn write_entries(path: &Path, entries: &EntryMap, write_ids: bool) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;

    let mut header: Vec<&str> = Vec::with_capacity(10);
    if write_ids {
        header.push(ID_COLUMN);
    }
    header.extend(EntryField::ALL.map(EntryField::name));
    writer.write_record(&header)?;

    for (id, entry) in entries {
        let mut row: Vec<String> = Vec::with_capacity(10);
        if write_ids {
            row.push(id.to_string());
        }
        row.extend(EntryField::ALL.map(|field| entry.field_text(field).unwrap_or_default()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Position of each entry field in a CSV header.
struct ColumnIndex {
    positions: [Option<usize>; 9],
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Self {
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();
        let positions = EntryField::ALL.map(|field| names.iter().position(|n| *n == field.name()));
        Self { positions }
    }

    fn missing_required(&self) -> bool {
        EntryField::ALL
            .into_iter()
            .zip(self.positions)
            .any(|(field, pos)| field.is_required() && pos.is_none())
    }

    fn draft(&self, record: &StringRecord) -> EntryDraft {
        let mut draft = EntryDraft::default();
        for (field, pos) in EntryField::ALL.into_iter().zip(self.positions) {
            if let Some(value) = pos.and_then(|i| record.get(i)) {
                draft.set(field, value);
            }
        }
        draft
    }
}

impl AddressStore for CsvStore {
    fn bind(&mut self, locator: &Path) -> Result<()> {
        if locator.as_os_str().is_empty() {
            return Err(StoreError::InvalidResource("empty CSV path".into()));
        }
        if locator.is_dir() {
            return Err(StoreError::InvalidResource(format!(
                "{} is a directory, not a CSV file",
                locator.display()
            )));
        }
        if self.is_open() {
            debug!("rebinding open CSV store; closing current session");
            self.close();
        }
        self.path = Some(locator.to_path_buf());
        Ok(())
    }

    fn locator(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn open(&mut self) -> Result<()> {
        let path = self.path()?.to_path_buf();

        let entries = if path.exists() {
            let entries = load_entries(&path)?;
            info!(path = %path.display(), count = entries.len(), "loaded CSV address book");
            entries
        } else {
            info!(path = %path.display(), "CSV file not found; starting empty");
            EntryMap::new()
        };

        self.state = Some(CsvState {
            entries,
            high_water: None,
        });
        Ok(())
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            debug!(path = ?self.path, "CSV store closed");
        }
    }

    fn is_open(&self) -> bool {
        self.state.is_some()
    }

    fn save(&mut self) -> Result<()> {
        let path = self.path()?;
        let state = self.state()?;

        // Written beside the target and renamed over it, so a failed save
        // leaves the previous file untouched.
        let tmp = temp_path(path);
        if let Err(e) = write_entries(&tmp, &state.entries, self.write_ids) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        std::fs::rename(&tmp, path)?;

        debug!(path = %path.display(), count = state.entries.len(), "saved CSV address book");
        Ok(())
    }

    fn add(&mut self, entry: Entry) -> Result<AddOutcome> {
        let state = self.state_mut()?;

        if state.entries.values().any(|e| e.same_identity_as(&entry)) {
            debug!(
                firstname = entry.firstname(),
                lastname = entry.lastname(),
                "rejecting duplicate entry"
            );
            return Ok(AddOutcome::Duplicate);
        }

        let id = state.next_id();
        state.entries.insert(id, entry);
        state.high_water = Some(id);
        Ok(AddOutcome::Added(id))
    }

    fn get(&self, id: EntryId) -> Result<Option<Entry>> {
        Ok(self.state()?.entries.get(&id).cloned())
    }

    fn get_all(&self) -> Result<EntryMap> {
        Ok(self.state()?.entries.clone())
    }

    fn search(&self, field: Option<EntryField>, query: &str) -> Result<EntryMap> {
        self.filtered(|entry| entry.matches(field, query))
    }

    fn update(&mut self, id: EntryId, updates: &[FieldUpdate]) -> Result<EntryId> {
        let state = self.state_mut()?;
        let slot = state.entries.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *slot = slot.with_updates(updates)?;
        Ok(id)
    }

    fn delete(&mut self, id: EntryId) -> Result<Option<EntryId>> {
        let state = self.state_mut()?;
        Ok(state.entries.remove(&id).map(|_| id))
    }

    fn birthdays_on(&self, date: NaiveDate) -> Result<EntryMap> {
        self.filtered(|entry| entry.has_birthday_on(date))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.state()?.entries.len())
    }
}

/// `book.csv` is staged as `book.csv.tmp` in the same directory.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
