//! Table layout of a quad store file.
//!
//! One table per index order, the interning tables in both directions, the
//! primary quad table, per-key index counts, and a scalar `meta` table for
//! the horizon and counters.

use redb::{ReadableTable, Table, TableDefinition, WriteTransaction};

use crate::storage::engine::{EngineError, redb_error};

/// Interned name -> node id.
pub const NODE_IDS: TableDefinition<&str, u64> = TableDefinition::new("node_ids");

/// Node id -> interned name.
pub const NODE_NAMES: TableDefinition<u64, &str> = TableDefinition::new("node_names");

/// Node id -> number of live quads referencing it. Absent when zero.
pub const NODE_SIZES: TableDefinition<u64, u64> = TableDefinition::new("node_sizes");

/// Scalar counters, keyed by the names in [`meta`].
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Primary index: 32-byte quad key -> horizon at which it was added.
pub const QUADS: TableDefinition<&[u8], u64> = TableDefinition::new("quads");

/// Index order tag || key prefix -> number of duplicates under that prefix.
pub const INDEX_COUNTS: TableDefinition<&[u8], u64> = TableDefinition::new("index_counts");

/// Duplicate-sorted index orders. Keys are `prefix || quad key`.
pub const IDX_SUBJECT: TableDefinition<&[u8], ()> = TableDefinition::new("idx_subject");
pub const IDX_PREDICATE: TableDefinition<&[u8], ()> = TableDefinition::new("idx_predicate");
pub const IDX_OBJECT: TableDefinition<&[u8], ()> = TableDefinition::new("idx_object");
pub const IDX_LABEL: TableDefinition<&[u8], ()> = TableDefinition::new("idx_label");
pub const IDX_SUBJECT_PREDICATE: TableDefinition<&[u8], ()> =
    TableDefinition::new("idx_subject_predicate");

/// Well-known keys of the [`META`] table.
pub mod meta {
    /// Current write-log position.
    pub const HORIZON: &str = "horizon";
    /// Number of live quads.
    pub const SIZE: &str = "size";
    /// Number of live nodes.
    pub const NODES: &str = "nodes";
    /// Next node id to assign.
    pub const NEXT_ID: &str = "next_id";
}

/// Create every table so that read transactions never see a missing one.
pub fn create_all(txn: &WriteTransaction) -> Result<(), EngineError> {
    let op = "create tables";
    txn.open_table(NODE_IDS).map_err(redb_error(op))?;
    txn.open_table(NODE_NAMES).map_err(redb_error(op))?;
    txn.open_table(NODE_SIZES).map_err(redb_error(op))?;
    txn.open_table(META).map_err(redb_error(op))?;
    txn.open_table(QUADS).map_err(redb_error(op))?;
    txn.open_table(INDEX_COUNTS).map_err(redb_error(op))?;
    for def in [
        IDX_SUBJECT,
        IDX_PREDICATE,
        IDX_OBJECT,
        IDX_LABEL,
        IDX_SUBJECT_PREDICATE,
    ] {
        txn.open_table(def).map_err(redb_error(op))?;
    }
    Ok(())
}

/// Read a [`META`] counter, treating a missing entry as zero.
pub fn counter(
    table: &impl ReadableTable<&'static str, u64>,
    key: &str,
) -> Result<u64, EngineError> {
    Ok(table
        .get(key)
        .map_err(redb_error("read counter"))?
        .map_or(0, |guard| guard.value()))
}

/// Add `delta` to a [`META`] counter, saturating at zero.
pub fn adjust_counter(
    table: &mut Table<'_, &'static str, u64>,
    key: &str,
    delta: i64,
) -> Result<u64, EngineError> {
    let current = counter(&*table, key)?;
    let updated = current.saturating_add_signed(delta);
    table
        .insert(key, updated)
        .map_err(redb_error("write counter"))?;
    Ok(updated)
}
