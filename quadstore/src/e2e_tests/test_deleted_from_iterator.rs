//! Test that removed quads drop out of a reset iterator.

use crate::e2e_tests::helpers::*;
use crate::iterator::GraphIterator;
use crate::storage::{RemoveOutcome, Writer};
use crate::types::Direction;

#[test]
fn test_deleted_quad_not_yielded_after_reset() {
    let store = loaded_store();
    let e = store.value_of("E").unwrap();
    let mut it: GraphIterator = store.quad_iterator(Direction::Subject, e).into();

    assert_eq!(iterated_quads(&store, &mut it), vec![q("E", "follows", "F")]);
    it.reset();

    let outcome = Writer::new(&store)
        .remove_quad(&q("E", "follows", "F"))
        .unwrap();
    assert!(matches!(outcome, RemoveOutcome::Removed(_)));

    assert!(iterated_quads(&store, &mut it).is_empty());
}

#[test]
fn test_removed_node_leaves_nodes_all() {
    let store = loaded_store();
    Writer::new(&store)
        .remove_quad(&q("E", "follows", "F"))
        .unwrap();

    let mut nodes: GraphIterator = store.nodes_all_iterator().into();
    let names = iterated_names(&store, &mut nodes);
    assert!(!names.contains(&"E".to_string()));
    assert!(names.contains(&"F".to_string()));
    assert_eq!(names.len(), node_names().len() - 1);
}

#[test]
fn test_contains_reflects_removal() {
    let store = loaded_store();
    let key = store.quad_key(&q("E", "follows", "F")).unwrap().unwrap();
    let mut all: GraphIterator = store.quads_all_iterator().into();
    assert!(all.contains(key.into()).unwrap());

    Writer::new(&store)
        .remove_quad(&q("E", "follows", "F"))
        .unwrap();
    all.reset();
    assert!(!all.contains(key.into()).unwrap());
    assert!(!store.contains_quad(&q("E", "follows", "F")).unwrap());
}
