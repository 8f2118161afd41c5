//! Node value interning.
//!
//! Maps external node values to fixed-width [`NodeId`]s and back. Ids are
//! allocated from the `next_id` counter on first reference and the mapping
//! is never removed, even when the last quad referencing a value goes away.
//!
//! The empty string is the default-graph label and always maps to
//! [`NodeId::NONE`] without touching the engine.

use redb::{ReadableTable, WriteTransaction};

use crate::storage::engine::{EngineError, Snapshot, redb_error};
use crate::storage::tables::{self, META, NODE_IDS, NODE_NAMES, meta};
use crate::types::NodeId;

/// Interning operations over engine transactions.
pub struct ValueCodec;

impl ValueCodec {
    /// Look up the id of an interned value.
    pub fn id_of(snapshot: &Snapshot, value: &str) -> Result<Option<NodeId>, EngineError> {
        if value.is_empty() {
            return Ok(Some(NodeId::NONE));
        }
        lookup_id(&snapshot.table(NODE_IDS)?, value)
    }

    /// Look up the value an id was interned from.
    pub fn value_of(snapshot: &Snapshot, id: NodeId) -> Result<Option<String>, EngineError> {
        if id.is_none() {
            return Ok(Some(String::new()));
        }
        let names = snapshot.table(NODE_NAMES)?;
        let name = names.get(id.0).map_err(redb_error("lookup node name"))?;
        Ok(name.map(|guard| guard.value().to_string()))
    }

    /// Look up an id inside a write transaction without interning.
    pub fn id_in(txn: &WriteTransaction, value: &str) -> Result<Option<NodeId>, EngineError> {
        if value.is_empty() {
            return Ok(Some(NodeId::NONE));
        }
        let ids = txn.open_table(NODE_IDS).map_err(redb_error("open node ids"))?;
        lookup_id(&ids, value)
    }

    /// Return the id for `value`, allocating one if it is new.
    ///
    /// Idempotent: interning the same value twice yields the same id.
    pub fn intern(txn: &WriteTransaction, value: &str) -> Result<NodeId, EngineError> {
        if value.is_empty() {
            return Ok(NodeId::NONE);
        }

        let mut ids = txn.open_table(NODE_IDS).map_err(redb_error("open node ids"))?;
        if let Some(id) = lookup_id(&ids, value)? {
            return Ok(id);
        }

        let mut counters = txn.open_table(META).map_err(redb_error("open meta"))?;
        let id = tables::counter(&counters, meta::NEXT_ID)?.max(1);
        counters
            .insert(meta::NEXT_ID, id + 1)
            .map_err(redb_error("advance next id"))?;

        ids.insert(value, id).map_err(redb_error("intern value"))?;
        txn.open_table(NODE_NAMES)
            .map_err(redb_error("open node names"))?
            .insert(id, value)
            .map_err(redb_error("intern value"))?;

        tracing::trace!(id, value, "interned node value");
        Ok(NodeId(id))
    }
}

fn lookup_id(
    table: &impl ReadableTable<&'static str, u64>,
    value: &str,
) -> Result<Option<NodeId>, EngineError> {
    let id = table.get(value).map_err(redb_error("lookup node id"))?;
    Ok(id.map(|guard| NodeId(guard.value())))
}
