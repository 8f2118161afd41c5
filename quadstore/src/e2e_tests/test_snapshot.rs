//! Test snapshot isolation of an iteration in progress.

use crate::config::StoreConfig;
use crate::e2e_tests::helpers::*;
use crate::iterator::GraphIterator;
use crate::storage::Writer;
use crate::types::{Direction, Quad};

fn paged_store() -> TestStore {
    let store = TestStore::with_config(&StoreConfig::default().page_size(2));
    Writer::new(&store).add_quad_set(&quad_set()).unwrap();
    store
}

fn drain_count(it: &mut GraphIterator) -> usize {
    let mut count = 0;
    while it.next().unwrap() {
        count += 1;
    }
    count
}

#[test]
fn test_add_during_iteration_seen_after_reset() {
    let store = paged_store();
    let mut it: GraphIterator = store.quads_all_iterator().into();

    assert!(it.next().unwrap());
    Writer::new(&store)
        .add_quad(&q("H", "follows", "A"))
        .unwrap();
    assert_eq!(1 + drain_count(&mut it), 11);

    it.reset();
    assert_eq!(drain_count(&mut it), 12);
}

#[test]
fn test_remove_during_iteration_keeps_snapshot() {
    let store = paged_store();
    let b = store.value_of("B").unwrap();
    let mut it: GraphIterator = store.quad_iterator(Direction::Object, b).into();

    assert!(it.next().unwrap());
    let first = store.quad(it.result().unwrap()).unwrap();
    let rest: Vec<Quad> = quad_set()
        .into_iter()
        .filter(|quad| quad.object == "B" && *quad != first)
        .collect();
    let mut writer = Writer::new(&store);
    for quad in &rest {
        writer.remove_quad(quad).unwrap();
    }

    assert_eq!(1 + drain_count(&mut it), 3);
    it.reset();
    assert_eq!(iterated_quads(&store, &mut it), vec![first]);
}

#[test]
fn test_negative_contains_is_reliable() {
    let store = paged_store();
    let c = store.value_of("C").unwrap();
    let mut it: GraphIterator = store.quad_iterator(Direction::Subject, c).into();

    let missing = store.quad_key(&q("A", "follows", "B")).unwrap().unwrap();
    assert!(!it.contains(missing.into()).unwrap());

    let absent = store.quad_key(&q("C", "follows", "A")).unwrap().unwrap();
    assert!(!it.contains(absent.into()).unwrap());
    assert_eq!(store.quad_key(&q("C", "follows", "Z")).unwrap(), None);

    assert!(it.next().unwrap());
    assert!(!it.contains(absent.into()).unwrap());
}

#[test]
fn test_links_to_pass_hides_later_adds() {
    let store = paged_store();
    let b = store.value_of("B").unwrap();
    let g = store.value_of("G").unwrap();
    let targets = store.fixed_iterator().with(b).with(g);
    let mut it: GraphIterator = store.links_to(targets, Direction::Object).into();

    assert!(it.next().unwrap());
    Writer::new(&store)
        .add_quad(&q("Z", "follows", "G"))
        .unwrap();
    assert_eq!(1 + drain_count(&mut it), 5);

    it.reset();
    assert_eq!(drain_count(&mut it), 6);
}

#[test]
fn test_intersection_pass_keeps_removed_matches() {
    let store = paged_store();
    let d = store.value_of("D").unwrap();
    let follows = store.value_of("follows").unwrap();
    let mut it: GraphIterator = store
        .and()
        .with(store.quad_iterator(Direction::Subject, d))
        .with(store.quad_iterator(Direction::Predicate, follows))
        .into();

    assert!(it.next().unwrap());
    assert_eq!(store.quad(it.result().unwrap()).unwrap(), q("D", "follows", "B"));
    Writer::new(&store)
        .remove_quad(&q("D", "follows", "G"))
        .unwrap();
    assert_eq!(1 + drain_count(&mut it), 2);

    it.reset();
    assert_eq!(iterated_quads(&store, &mut it), vec![q("D", "follows", "B")]);
}
