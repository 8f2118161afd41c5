//! Test creating, reopening and closing stores.

use crate::config::StoreConfig;
use crate::e2e_tests::helpers::*;
use crate::storage::{QuadStore, StoreError, Writer};
use crate::types::Horizon;

#[test]
fn test_create_empty_store() {
    let store = TestStore::new();
    assert_eq!(store.size().unwrap(), 0);
    assert_eq!(store.horizon().unwrap(), Horizon(0));
}

#[test]
fn test_create_in_bad_path_fails() {
    let err = QuadStore::create(
        "/dev/null/some terrible path".as_ref(),
        &StoreConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Open(_)));
}

#[test]
fn test_create_over_existing_store_fails() {
    let store = TestStore::new();
    let path = store.path().to_path_buf();
    let err = QuadStore::create(&path, &StoreConfig::default()).unwrap_err();
    assert!(matches!(err, StoreError::Open(_)));
}

#[test]
fn test_round_trip_values_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reopen.redb");
    let quad = crate::types::Quad::new("Something", "points_to", "Something Else", "context");

    {
        let store = QuadStore::create(&path, &StoreConfig::default()).unwrap();
        Writer::new(&store).add_quad(&quad).unwrap();
        store.close();
    }

    let store = QuadStore::open(&path, &StoreConfig::default()).unwrap();
    for value in ["Something", "points_to", "Something Else", "context"] {
        let id = store.value_of(value).unwrap();
        assert_eq!(store.name_of(id).unwrap(), value);
        assert_eq!(store.value_of(&store.name_of(id).unwrap()).unwrap(), id);
    }
    assert_eq!(store.size().unwrap(), 1);
    assert_eq!(store.horizon().unwrap(), Horizon(1));
}

#[test]
fn test_operations_after_close_fail() {
    let store = loaded_store();
    let mut it = store.nodes_all_iterator();
    store.close();

    assert!(store.size().unwrap_err().is_closed());
    assert!(store.value_of("A").unwrap_err().is_closed());
    assert!(it.next().unwrap_err().is_closed());
    let err = Writer::new(&store).add_quad(&q("A", "follows", "C")).unwrap_err();
    assert!(err.store_error().is_some_and(StoreError::is_closed));
}
