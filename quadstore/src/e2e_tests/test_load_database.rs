//! Test loading the follower graph and removing from it.

use crate::e2e_tests::helpers::*;
use crate::iterator::GraphIterator;
use crate::storage::{RemoveOutcome, Writer};
use crate::types::{Direction, Horizon};

#[test]
fn test_load_quad_set() {
    let store = loaded_store();
    assert_eq!(store.size().unwrap(), 11);
    assert_eq!(store.horizon().unwrap(), Horizon(11));

    let b = store.value_of("B").unwrap();
    assert_eq!(store.size_of(b).unwrap(), 5);
    assert_eq!(store.node_count().unwrap(), 11);
}

#[test]
fn test_remove_quad_updates_counts() {
    let store = loaded_store();
    let outcome = Writer::new(&store)
        .remove_quad(&q("A", "follows", "B"))
        .unwrap();
    assert_eq!(outcome, RemoveOutcome::Removed(Horizon(12)));

    assert_eq!(store.size().unwrap(), 10);
    let b = store.value_of("B").unwrap();
    assert_eq!(store.size_of(b).unwrap(), 4);

    let a = store.value_of("A").unwrap();
    assert_eq!(store.size_of(a).unwrap(), 0);
    let mut by_a: GraphIterator = store.quad_iterator(Direction::Subject, a).into();
    assert!(iterated_quads(&store, &mut by_a).is_empty());
}

#[test]
fn test_removed_quad_leaves_every_position() {
    let store = loaded_store();
    let quad = q("D", "follows", "G");
    let key = store.quad_key(&quad).unwrap().unwrap();
    let before = store.size().unwrap();

    Writer::new(&store).remove_quad(&quad).unwrap();
    assert_eq!(store.size().unwrap(), before - 1);

    for direction in Direction::ALL {
        let mut it: GraphIterator = store.quad_iterator(direction, key.get(direction)).into();
        assert!(!iterated_quads(&store, &mut it).contains(&quad));
    }
}

#[test]
fn test_readding_removed_quad() {
    let store = loaded_store();
    let mut writer = Writer::new(&store);
    writer.remove_quad(&q("A", "follows", "B")).unwrap();
    writer.add_quad(&q("A", "follows", "B")).unwrap();

    assert_eq!(store.size().unwrap(), 11);
    assert_eq!(store.horizon().unwrap(), Horizon(13));
    let key = store.quad_key(&q("A", "follows", "B")).unwrap().unwrap();
    assert_eq!(store.quad_horizon(&key).unwrap(), Horizon(13));
}
