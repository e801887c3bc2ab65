//! Backend conformance checks.
//!
//! Every backend must behave the same from the caller's side. Each check
//! takes a factory that builds a bound, unopened store for a file inside the
//! given directory, runs against a fresh fixture and panics on a violation.
//! Use [`conformance_suite!`](crate::conformance_suite) to turn the whole set
//! into `#[test]` functions for one backend.

use std::collections::BTreeSet;
use std::path::Path;

use addrbook_core::{Entry, EntryField, EntryId, FieldUpdate};
use addrbook_store::{AddOutcome, AddressStore, StoreError, StoreExt};
use chrono::NaiveDate;

use crate::fixtures::{birthday_entries, jane_smith, sample_entries, TestFixture};

fn opened<S: AddressStore>(fixture: &TestFixture, make: &impl Fn(&Path) -> S) -> S {
    let mut store = make(fixture.dir());
    store.open().expect("open failed");
    store
}

fn add_ok<S: AddressStore>(store: &mut S, entry: Entry) -> EntryId {
    store
        .add(entry)
        .expect("add failed")
        .id()
        .expect("entry was reported as duplicate")
}

fn values(store: &impl AddressStore) -> BTreeSet<Entry> {
    store.get_all().expect("get_all failed").into_values().collect()
}

/// Every added entry reads back equal, under a distinct positive id.
pub fn add_then_get<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = opened(&fixture, &make);

    let mut ids = BTreeSet::new();
    for entry in sample_entries() {
        let id = add_ok(&mut store, entry.clone());
        assert!(ids.insert(id), "id {id} assigned twice");
        assert_eq!(store.get(id).unwrap(), Some(entry));
    }
    assert_eq!(store.len().unwrap(), sample_entries().len());
    assert_eq!(store.get_all().unwrap().keys().copied().collect::<BTreeSet<_>>(), ids);
}

/// Same firstname, lastname and email is a duplicate; anything else is not.
pub fn duplicates_are_rejected<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = opened(&fixture, &make);

    let first = add_ok(&mut store, jane_smith());
    let dup = Entry::builder("Jane", "Smith")
        .place("Somewhere else")
        .email("jane.smith@example.com")
        .build()
        .unwrap();
    assert_eq!(store.add(dup).unwrap(), AddOutcome::Duplicate);
    assert_eq!(store.len().unwrap(), 1);

    // Case differs: not a duplicate
    let other_case = Entry::builder("jane", "Smith")
        .email("jane.smith@example.com")
        .build()
        .unwrap();
    let second = add_ok(&mut store, other_case);
    assert_eq!(second, first.next(), "a duplicate must not consume an id");

    // Missing email differs from a present one
    add_ok(&mut store, Entry::builder("Jane", "Smith").build().unwrap());
    let no_email_again = Entry::builder("Jane", "Smith").phone("1").build().unwrap();
    assert!(store.add(no_email_again).unwrap().is_duplicate());
}

/// Deleting removes exactly one entry; deleting again finds nothing.
pub fn delete_removes_entry<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = opened(&fixture, &make);

    let ids: Vec<EntryId> = sample_entries().into_iter().map(|e| add_ok(&mut store, e)).collect();
    let victim = ids[1];

    assert_eq!(store.delete(victim).unwrap(), Some(victim));
    assert_eq!(store.get(victim).unwrap(), None);
    assert_eq!(store.len().unwrap(), ids.len() - 1);
    assert_eq!(store.delete(victim).unwrap(), None);

    let fresh = add_ok(&mut store, sample_entries()[1].clone());
    assert!(!ids.contains(&fresh), "deleted id {victim} was reused");
}

/// Substring search ignores case, and absent fields never match.
pub fn search_semantics<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = opened(&fixture, &make);
    for entry in sample_entries() {
        add_ok(&mut store, entry);
    }

    let lastnames = |hits: addrbook_store::EntryMap| {
        hits.into_values().map(|e| e.lastname().to_string()).collect::<BTreeSet<_>>()
    };

    let hits = store.search(Some(EntryField::Lastname), "smith").unwrap();
    assert_eq!(lastnames(hits), BTreeSet::from(["Smith".to_string(), "Smithson".to_string()]));

    let hits = store.search(Some(EntryField::Lastname), "SMITH").unwrap();
    assert_eq!(hits.len(), 2);

    // Any field: also matches the email of Jane and John
    let hits = store.search(None, "smith").unwrap();
    assert_eq!(hits.len(), 2);

    let hits = store.search(None, "berlin").unwrap();
    assert_eq!(lastnames(hits), BTreeSet::from(["Smith".to_string()]));

    // Numeric fields match on their text form
    let hits = store.search(Some(EntryField::PostalCode), "511").unwrap();
    assert_eq!(lastnames(hits), BTreeSet::from(["Mustermann".to_string()]));

    let hits = store.search(Some(EntryField::Birthdate), "-07-").unwrap();
    assert_eq!(hits.len(), 1);

    // Empty query matches every present value and nothing absent
    let with_email = store.search(Some(EntryField::Email), "").unwrap();
    assert_eq!(with_email.len(), 3);

    // Characters that are wildcards in SQL are literal here
    assert!(store.search(None, "%").unwrap().is_empty());
    assert!(store.search(Some(EntryField::Lastname), "Sm_th").unwrap().is_empty());
    assert_eq!(store.search(Some(EntryField::Street), "\"lane\"").unwrap().len(), 1);

    assert!(store.search(Some(EntryField::Phone), "no such number").unwrap().is_empty());
}

/// Field names outside the fixed set fail with `InvalidField`.
pub fn unknown_field_names<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = opened(&fixture, &make);
    let id = add_ok(&mut store, jane_smith());

    assert!(matches!(
        store.search_by_name("nickname", "x"),
        Err(StoreError::InvalidField(name)) if name == "nickname"
    ));
    assert!(matches!(store.search_by_name("Lastname", "x"), Err(StoreError::InvalidField(_))));
    assert_eq!(store.search_by_name("lastname", "smi").unwrap().len(), 1);
    assert_eq!(store.search_by_name("", "berlin").unwrap().len(), 1);

    assert!(matches!(
        store.update_by_name(id, &[("place", "Bonn"), ("zip", "1")]),
        Err(StoreError::InvalidField(_))
    ));
    assert_eq!(store.get(id).unwrap().unwrap().place(), Some("Berlin"));
}

/// Updates re-validate, apply all-or-nothing and report missing ids.
pub fn update_semantics<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = opened(&fixture, &make);
    let id = add_ok(&mut store, jane_smith());

    let updated = store
        .update(
            id,
            &[
                FieldUpdate::new(EntryField::Place, "Potsdam"),
                FieldUpdate::new(EntryField::PostalCode, "14467"),
                FieldUpdate::clear(EntryField::Phone),
            ],
        )
        .unwrap();
    assert_eq!(updated, id);

    let entry = store.get(id).unwrap().unwrap();
    assert_eq!(entry.place(), Some("Potsdam"));
    assert_eq!(entry.postal_code(), Some(14467));
    assert_eq!(entry.phone(), None);
    assert_eq!(entry.street(), Some("Baker Street"));

    let before = store.get(id).unwrap();
    for bad in [
        FieldUpdate::new(EntryField::Email, "not-an-address"),
        FieldUpdate::new(EntryField::Birthdate, "14.07.1985"),
        FieldUpdate::new(EntryField::PostalCode, "0"),
        FieldUpdate::clear(EntryField::Lastname),
    ] {
        let result = store.update(id, &[FieldUpdate::new(EntryField::Place, "Bonn"), bad.clone()]);
        assert!(
            matches!(&result, Err(StoreError::Validation(e)) if e.field() == bad.field),
            "{bad:?} gave {result:?}"
        );
        assert_eq!(store.get(id).unwrap(), before, "failed update changed the entry");
    }

    let missing = EntryId::new(999).unwrap();
    assert!(matches!(
        store.update(missing, &[FieldUpdate::new(EntryField::Place, "X")]),
        Err(StoreError::NotFound(id)) if id == missing
    ));
}

/// Exactly the entries born on the given month and day are returned.
pub fn birthdays<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = opened(&fixture, &make);

    let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    for entry in birthday_entries(date) {
        add_ok(&mut store, entry);
    }
    add_ok(&mut store, Entry::builder("No", "Birthdate").build().unwrap());

    let hits = store.birthdays_on(date).unwrap();
    assert_eq!(hits.len(), 4);
    assert!(hits.values().all(|e| e.lastname() == "Today"));
}

/// Today's birthdays are the entries born on the local date's month and day.
pub fn todays_birthdays<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = opened(&fixture, &make);

    let today = chrono::Local::now().date_naive();
    for entry in birthday_entries(today) {
        add_ok(&mut store, entry);
    }
    add_ok(&mut store, Entry::builder("No", "Birthdate").build().unwrap());

    let hits = store.get_todays_birthdays().unwrap();
    assert_eq!(hits.len(), 4);
    assert!(hits.values().all(|e| e.lastname() == "Today"));
}

/// A leap-day birthday only matches February 29.
pub fn leap_day_birthdays<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = opened(&fixture, &make);
    add_ok(&mut store, Entry::builder("Leap", "Year").birthdate("2000-02-29").build().unwrap());

    let feb_28 = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
    let mar_1 = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let feb_29 = NaiveDate::from_ymd_opt(2028, 2, 29).unwrap();
    assert!(store.birthdays_on(feb_28).unwrap().is_empty());
    assert!(store.birthdays_on(mar_1).unwrap().is_empty());
    assert_eq!(store.birthdays_on(feb_29).unwrap().len(), 1);
}

/// Saved content survives close and reopen.
pub fn reopen_preserves_content<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = opened(&fixture, &make);
    for entry in sample_entries() {
        add_ok(&mut store, entry);
    }
    let before = values(&store);
    store.save().unwrap();
    store.close();
    assert!(!store.is_open());

    store.open().unwrap();
    assert_eq!(values(&store), before);
    assert!(store.get_all().unwrap().keys().all(|id| id.get() > 0));

    // A second fresh store on the same locator sees the same data
    drop(store);
    let reopened = opened(&fixture, &make);
    assert_eq!(values(&reopened), before);
}

/// Every data operation on a closed store fails with `ResourceUnavailable`.
pub fn closed_store_is_unavailable<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = make(fixture.dir());
    assert!(!store.is_open());

    let unavailable = |r: Result<(), StoreError>| matches!(r, Err(StoreError::ResourceUnavailable(_)));
    assert!(unavailable(store.add(jane_smith()).map(drop)));
    assert!(unavailable(store.get(EntryId::FIRST).map(drop)));
    assert!(unavailable(store.get_all().map(drop)));
    assert!(unavailable(store.search(None, "x").map(drop)));
    assert!(unavailable(store.update(EntryId::FIRST, &[]).map(drop)));
    assert!(unavailable(store.delete(EntryId::FIRST).map(drop)));
    assert!(unavailable(store.birthdays_on(NaiveDate::MIN).map(drop)));
    assert!(unavailable(store.len().map(drop)));
    assert!(unavailable(store.save()));

    // close is always allowed
    store.close();
    store.close();

    // Same after a close
    store.open().unwrap();
    store.close();
    assert!(unavailable(store.get_all().map(drop)));
}

/// Sessions close the store on success and on error.
pub fn sessions_close_on_every_path<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = make(fixture.dir());

    let id = store
        .with_session(|store| Ok(store.add(jane_smith())?.id()))
        .unwrap()
        .expect("first add is never a duplicate");
    assert!(!store.is_open());

    let result: Result<(), StoreError> = store.with_session(|store| {
        store.add(Entry::builder("Lost", "Entry").build()?)?;
        Err(StoreError::NotFound(EntryId::FIRST))
    });
    assert!(matches!(result, Err(StoreError::NotFound(_))));
    assert!(!store.is_open());

    {
        let session = store.session().unwrap();
        assert!(session.is_open());
        assert_eq!(session.get(id).unwrap(), Some(jane_smith()));
    }
    assert!(!store.is_open());
}

/// Entries come back sorted by the entry ordering, not by id.
pub fn sorted_entries_use_entry_order<S: AddressStore>(make: impl Fn(&Path) -> S) {
    let fixture = TestFixture::new();
    let mut store = opened(&fixture, &make);
    for entry in sample_entries() {
        add_ok(&mut store, entry);
    }

    let sorted = store.sorted_entries().unwrap();
    let firstnames: Vec<&str> = sorted.iter().map(|(_, e)| e.firstname()).collect();
    assert_eq!(firstnames, ["Ana", "Erika", "Jane", "John", "Max"]);
}

/// Generate one `#[test]` per conformance check for a backend.
///
/// The factory is an expression of type `Fn(&Path) -> S` returning a bound,
/// unopened store inside the given directory.
#[macro_export]
macro_rules! conformance_suite {
    (@tests $make:expr; $($check:ident),* $(,)?) => {
        $(
            #[test]
            fn $check() {
                $crate::conformance::$check($make);
            }
        )*
    };
    ($name:ident, $make:expr) => {
        mod $name {
            use super::*;

            $crate::conformance_suite!(@tests $make;
                add_then_get,
                duplicates_are_rejected,
                delete_removes_entry,
                search_semantics,
                unknown_field_names,
                update_semantics,
                birthdays,
                todays_birthdays,
                leap_day_birthdays,
                reopen_preserves_content,
                closed_store_is_unavailable,
                sessions_close_on_every_path,
                sorted_entries_use_entry_order,
            );
        }
    };
}
