//! Strong type definitions for the address book.
//!
//! Identifiers are newtypes to prevent mixing them up with other integers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

/// A backend-assigned entry identifier.
///
/// Always positive. Unique within one storage resource, but not comparable
/// across backends.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(NonZeroU64);

impl EntryId {
    /// The first id a backend hands out.
    pub const FIRST: Self = Self(NonZeroU64::MIN);

    /// Create an id, returning `None` for zero.
    pub const fn new(value: u64) -> Option<Self> {
        match NonZeroU64::new(value) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Create an id from a database rowid, returning `None` for non-positive values.
    pub fn from_rowid(rowid: i64) -> Option<Self> {
        u64::try_from(rowid).ok().and_then(Self::new)
    }

    /// The raw value.
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// The value as a database rowid.
    pub fn as_rowid(self) -> i64 {
        i64::try_from(self.0.get()).unwrap_or(i64::MAX)
    }

    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntryId> for u64 {
    fn from(id: EntryId) -> Self {
        id.get()
    }
}

impl TryFrom<u64> for EntryId {
    type Error = std::num::TryFromIntError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        NonZeroU64::try_from(value).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_rejects_zero() {
        assert!(EntryId::new(0).is_none());
        assert!(EntryId::try_from(0u64).is_err());
        assert_eq!(EntryId::new(7).unwrap().get(), 7);
    }

    #[test]
    fn test_entry_id_rowid() {
        assert!(EntryId::from_rowid(-1).is_none());
        assert!(EntryId::from_rowid(0).is_none());
        let id = EntryId::from_rowid(42).unwrap();
        assert_eq!(id.as_rowid(), 42);
    }

    #[test]
    fn test_entry_id_next_and_display() {
        assert_eq!(EntryId::FIRST.next().get(), 2);
        assert_eq!(format!("{}", EntryId::FIRST), "1");
        assert_eq!(format!("{:?}", EntryId::FIRST), "EntryId(1)");
    }

    #[test]
    fn test_entry_id_serde_is_plain_number() {
        let id = EntryId::new(5).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "5");
        let back: EntryId = serde_json::from_str("5").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<EntryId>("0").is_err());
    }
}
