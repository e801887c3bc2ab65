//! Property tests run against both backends.

use std::collections::BTreeSet;

use addrbook_core::Entry;
use addrbook_store::{AddressStore, CsvStore, SqliteStore};
use addrbook_testkit::fixtures::TestFixture;
use addrbook_testkit::generators::{distinct_entries, entry, optional_field_update};
use proptest::prelude::*;

fn backends(fixture: &TestFixture) -> Vec<Box<dyn AddressStore>> {
    vec![
        Box::new(CsvStore::at(fixture.csv_path()).unwrap()),
        Box::new(SqliteStore::at(fixture.db_path()).unwrap()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn added_entries_read_back(entries in distinct_entries(8)) {
        let fixture = TestFixture::new();
        for mut store in backends(&fixture) {
            store.open().unwrap();
            for entry in &entries {
                let id = store.add(entry.clone()).unwrap().id().unwrap();
                let got = store.get(id).unwrap();
                prop_assert_eq!(got.as_ref(), Some(entry));
            }
            prop_assert_eq!(store.len().unwrap(), entries.len());
        }
    }

    #[test]
    fn saved_content_survives_reopen(entries in distinct_entries(8)) {
        let fixture = TestFixture::new();
        let expected: BTreeSet<Entry> = entries.iter().cloned().collect();
        for mut store in backends(&fixture) {
            store.open().unwrap();
            for entry in &entries {
                store.add(entry.clone()).unwrap();
            }
            store.save().unwrap();
            store.close();

            store.open().unwrap();
            let reloaded: BTreeSet<Entry> = store.get_all().unwrap().into_values().collect();
            prop_assert_eq!(&reloaded, &expected);
        }
    }

    #[test]
    fn adding_twice_is_a_duplicate(e in entry()) {
        let fixture = TestFixture::new();
        for mut store in backends(&fixture) {
            store.open().unwrap();
            prop_assert!(!store.add(e.clone()).unwrap().is_duplicate());
            prop_assert!(store.add(e.clone()).unwrap().is_duplicate());
            prop_assert_eq!(store.len().unwrap(), 1);
        }
    }

    #[test]
    fn update_is_visible_to_get(e in entry(), update in optional_field_update()) {
        let fixture = TestFixture::new();
        for mut store in backends(&fixture) {
            store.open().unwrap();
            let id = store.add(e.clone()).unwrap().id().unwrap();
            store.update(id, std::slice::from_ref(&update)).unwrap();

            let expected = e.with_updates(std::slice::from_ref(&update)).unwrap();
            prop_assert_eq!(store.get(id).unwrap(), Some(expected));
        }
    }

    #[test]
    fn search_agrees_with_entry_matching(entries in distinct_entries(8), query in "[a-zA-Z0-9@.]{1,3}") {
        let fixture = TestFixture::new();
        let expected = entries.iter().filter(|e| e.matches(None, &query)).count();
        for mut store in backends(&fixture) {
            store.open().unwrap();
            for entry in &entries {
                store.add(entry.clone()).unwrap();
            }
            prop_assert_eq!(store.search(None, &query).unwrap().len(), expected);
        }
    }
}
