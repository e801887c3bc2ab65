//! Address book configuration.
//!
//! A [`BookConfig`] names the storage file and, optionally, the backend. When
//! the backend is left out it is inferred from the file extension.

use std::path::{Path, PathBuf};

use addrbook_store::schema::DEFAULT_TABLE;
use addrbook_store::sqlite::has_db_suffix;
use serde::{Deserialize, Serialize};

use crate::error::{BookError, Result};

/// Default storage file.
pub const DEFAULT_PATH: &str = "addresses.csv";

/// Which storage backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Csv,
    Sqlite,
}

impl BackendKind {
    /// Pick a backend from the file extension.
    ///
    /// `.csv` selects the CSV backend and any database suffix the SQLite
    /// backend accepts selects SQLite. Anything else is `None`.
    pub fn infer(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("csv") {
            Some(BackendKind::Csv)
        } else if has_db_suffix(path) {
            Some(BackendKind::Sqlite)
        } else {
            None
        }
    }
}

/// Configuration for an [`AddressBook`](crate::AddressBook).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookConfig {
    /// Backend to use. Inferred from `path` when absent.
    pub backend: Option<BackendKind>,
    /// Storage file.
    pub path: PathBuf,
    /// SQLite table name.
    pub table: String,
    /// Write a leading `id` column in CSV files.
    pub csv_write_ids: bool,
    /// Save after every successful mutation.
    pub autosave: bool,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            backend: None,
            path: PathBuf::from(DEFAULT_PATH),
            table: DEFAULT_TABLE.to_string(),
            csv_write_ids: false,
            autosave: true,
        }
    }
}

impl BookConfig {
    /// Default configuration for the file at `path`.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the backend explicitly.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Parse a JSON configuration. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            BookError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// The backend to use: the explicit one, or the one inferred from `path`.
    pub fn resolved_backend(&self) -> Result<BackendKind> {
        if self.path.as_os_str().is_empty() {
            return Err(BookError::Config("storage path is empty".into()));
        }
        self.backend
            .or_else(|| BackendKind::infer(&self.path))
            .ok_or_else(|| {
                BookError::Config(format!(
                    "cannot infer a backend from {}; set \"backend\" to \"csv\" or \"sqlite\"",
                    self.path.display()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend() {
        assert_eq!(BackendKind::infer(Path::new("a.csv")), Some(BackendKind::Csv));
        assert_eq!(BackendKind::infer(Path::new("a.CSV")), Some(BackendKind::Csv));
        assert_eq!(BackendKind::infer(Path::new("a.db")), Some(BackendKind::Sqlite));
        assert_eq!(BackendKind::infer(Path::new("x/a.sqlite3")), Some(BackendKind::Sqlite));
        assert_eq!(BackendKind::infer(Path::new("a.txt")), None);
        assert_eq!(BackendKind::infer(Path::new("a")), None);
    }

    #[test]
    fn test_defaults() {
        let config = BookConfig::default();
        assert_eq!(config.path, PathBuf::from("addresses.csv"));
        assert_eq!(config.table, "AddressBook");
        assert!(config.autosave);
        assert!(!config.csv_write_ids);
        assert_eq!(config.resolved_backend().unwrap(), BackendKind::Csv);
    }

    #[test]
    fn test_from_json_partial() {
        let config = BookConfig::from_json_str(r#"{"path": "book.db", "table": "contacts"}"#).unwrap();
        assert_eq!(config.resolved_backend().unwrap(), BackendKind::Sqlite);
        assert_eq!(config.table, "contacts");
        assert!(config.autosave);
    }

    #[test]
    fn test_explicit_backend_wins() {
        let config = BookConfig::from_json_str(r#"{"backend": "csv", "path": "book.txt"}"#).unwrap();
        assert_eq!(config.resolved_backend().unwrap(), BackendKind::Csv);
    }

    #[test]
    fn test_unresolvable_backend() {
        let config = BookConfig::for_path("book.txt");
        assert!(matches!(config.resolved_backend(), Err(BookError::Config(_))));

        let empty = BookConfig::for_path("");
        assert!(matches!(empty.resolved_backend(), Err(BookError::Config(_))));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            BookConfig::from_json_str(r#"{"backend": "postgres"}"#),
            Err(BookError::ConfigParse(_))
        ));
        assert!(matches!(
            BookConfig::from_json_str(r#"{"pth": "typo.csv"}"#),
            Err(BookError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("book.json");
        std::fs::write(&file, r#"{"path": "contacts.sqlite", "csv_write_ids": true}"#).unwrap();

        let config = BookConfig::from_json_file(&file).unwrap();
        assert_eq!(config.path, PathBuf::from("contacts.sqlite"));
        assert!(config.csv_write_ids);

        assert!(matches!(
            BookConfig::from_json_file(dir.path().join("missing.json")),
            Err(BookError::Config(_))
        ));
    }
}
