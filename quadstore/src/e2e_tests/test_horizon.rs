//! Test horizon accounting across soft and strict writes.

use crate::e2e_tests::helpers::*;
use crate::storage::{AddOutcome, RemoveOutcome, Writer, WriterError, WriterOptions};
use crate::types::{Horizon, Quad};

#[test]
fn test_every_processed_op_ticks() {
    let store = TestStore::new();
    let mut writer = Writer::new(&store);

    assert_eq!(
        writer.add_quad(&q("A", "follows", "B")).unwrap(),
        AddOutcome::Added(Horizon(1))
    );
    assert_eq!(
        writer.add_quad(&q("A", "follows", "B")).unwrap(),
        AddOutcome::Duplicate(Horizon(2))
    );
    assert_eq!(
        writer.remove_quad(&q("B", "follows", "A")).unwrap(),
        RemoveOutcome::Missing(Horizon(3))
    );
    assert_eq!(
        writer.remove_quad(&q("A", "follows", "B")).unwrap(),
        RemoveOutcome::Removed(Horizon(4))
    );

    assert_eq!(store.horizon().unwrap(), Horizon(4));
    assert_eq!(store.size().unwrap(), 0);
}

#[test]
fn test_added_quad_records_its_horizon() {
    let store = loaded_store();
    let key = store.quad_key(&q("C", "follows", "D")).unwrap().unwrap();
    assert_eq!(store.quad_horizon(&key).unwrap(), Horizon(3));

    Writer::new(&store)
        .add_quad(&q("C", "follows", "D"))
        .unwrap();
    assert_eq!(store.quad_horizon(&key).unwrap(), Horizon(3));
    assert_eq!(store.horizon().unwrap(), Horizon(12));
}

#[test]
fn test_strict_rejections_do_not_tick() {
    let store = loaded_store();
    let mut writer = Writer::with_options(
        &store,
        WriterOptions {
            ignore_duplicate: false,
            ignore_missing: false,
        },
    );

    let err = writer.add_quad(&q("A", "follows", "B")).unwrap_err();
    assert!(matches!(err, WriterError::Duplicate(_)));
    let err = writer.remove_quad(&q("B", "follows", "A")).unwrap_err();
    assert!(matches!(err, WriterError::Missing(_)));

    assert_eq!(store.horizon().unwrap(), Horizon(11));
}

#[test]
fn test_invalid_quad_does_not_tick() {
    let store = loaded_store();
    let err = Writer::new(&store)
        .add_quad(&Quad::new("A", "", "B", ""))
        .unwrap_err();
    assert!(err.store_error().is_some());
    assert_eq!(store.horizon().unwrap(), Horizon(11));
}

#[test]
fn test_batch_reports_applied_prefix() {
    let store = TestStore::new();
    let mut writer = Writer::new(&store);
    let err = writer
        .add_quad_set(&[
            q("A", "follows", "B"),
            q("B", "follows", "C"),
            Quad::new("C", "follows", "", ""),
            q("C", "follows", "D"),
        ])
        .unwrap_err();

    assert!(matches!(err, WriterError::Batch { applied: 2, .. }));
    assert_eq!(store.size().unwrap(), 2);
    assert_eq!(store.horizon().unwrap(), Horizon(2));
}
