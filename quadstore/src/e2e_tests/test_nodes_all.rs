//! Test the all-nodes and all-quads iterators.

use crate::e2e_tests::helpers::*;
use crate::iterator::{GraphIterator, IteratorType};
use crate::types::Ref;

#[test]
fn test_nodes_all_iterator() {
    let store = loaded_store();
    let mut it: GraphIterator = store.nodes_all_iterator().into();

    let size = it.size().unwrap();
    assert!(size.value > 0 && size.value < 20);
    assert_eq!(it.iterator_type(), IteratorType::All);

    let (optimized, changed) = it.clone().optimize();
    assert!(!changed);
    assert_eq!(optimized.iterator_type(), IteratorType::All);

    for _ in 0..2 {
        assert_eq!(iterated_names(&store, &mut it), node_names());
        it.reset();
    }

    for name in node_names() {
        let id = store.value_of(&name).unwrap();
        assert!(it.contains(Ref::Node(id)).unwrap(), "missing {name}");
    }
}

#[test]
fn test_unknown_value_is_not_found() {
    let store = loaded_store();
    assert!(store.value_of("baller").unwrap_err().is_not_found());
}

#[test]
fn test_quads_all_yields_loaded_quads() {
    let store = loaded_store();
    let mut it: GraphIterator = store.quads_all_iterator().into();

    assert!(it.next().unwrap());
    let first = store.quad(it.result().unwrap()).unwrap();
    assert!(quad_set().contains(&first));

    it.reset();
    let mut expected = quad_set();
    expected.sort();
    assert_eq!(iterated_quads(&store, &mut it), expected);
}

#[test]
fn test_small_pages_yield_same_nodes() {
    let store = TestStore::with_config(&crate::config::StoreConfig::default().page_size(2));
    crate::storage::Writer::new(&store)
        .add_quad_set(&quad_set())
        .unwrap();
    let mut it: GraphIterator = store.nodes_all_iterator().into();
    assert_eq!(iterated_names(&store, &mut it), node_names());
}
