//! Per-node reference counts.
//!
//! `node_sizes` holds, for every live node, the number of live quads that
//! reference it in any position. A node is live while its count is
//! positive; the entry is removed when the count drops to zero. The `nodes`
//! meta counter tracks how many live nodes there are.

use std::ops::Bound;

use redb::{ReadableTable, WriteTransaction};

use crate::storage::engine::{EngineError, Snapshot, redb_error};
use crate::storage::multi::{Multi, Stride};
use crate::storage::tables::{self, META, NODE_SIZES, meta};
use crate::types::{NODE_ID_LEN, NodeId, QuadKey};

/// The distinct non-empty node ids referenced by `key`.
#[must_use]
pub fn referenced(key: &QuadKey) -> Vec<NodeId> {
    let mut ids: Vec<NodeId> = key.ids().into_iter().filter(|id| !id.is_none()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Count one more live quad referencing each id in `key`.
pub fn retain(txn: &WriteTransaction, key: &QuadKey) -> Result<(), EngineError> {
    adjust(txn, key, 1)
}

/// Count one fewer live quad referencing each id in `key`.
pub fn release(txn: &WriteTransaction, key: &QuadKey) -> Result<(), EngineError> {
    adjust(txn, key, -1)
}

fn adjust(txn: &WriteTransaction, key: &QuadKey, delta: i64) -> Result<(), EngineError> {
    let mut sizes = txn
        .open_table(NODE_SIZES)
        .map_err(redb_error("open node sizes"))?;
    let mut live_delta = 0i64;

    for id in referenced(key) {
        let current = sizes
            .get(id.0)
            .map_err(redb_error("read node size"))?
            .map_or(0, |guard| guard.value());
        let updated = current.saturating_add_signed(delta);

        if updated == 0 {
            if current > 0 {
                sizes.remove(id.0).map_err(redb_error("drop node size"))?;
                live_delta -= 1;
            }
        } else {
            sizes
                .insert(id.0, updated)
                .map_err(redb_error("write node size"))?;
            if current == 0 {
                live_delta += 1;
            }
        }
    }

    if live_delta != 0 {
        let mut counters = txn.open_table(META).map_err(redb_error("open meta"))?;
        tables::adjust_counter(&mut counters, meta::NODES, live_delta)?;
    }
    Ok(())
}

/// Number of live quads referencing `id`.
pub fn size_of(snapshot: &Snapshot, id: NodeId) -> Result<u64, EngineError> {
    let sizes = snapshot.table(NODE_SIZES)?;
    Ok(sizes
        .get(id.0)
        .map_err(redb_error("read node size"))?
        .map_or(0, |guard| guard.value()))
}

/// Returns `true` if `id` is referenced by at least one live quad.
pub fn is_live(snapshot: &Snapshot, id: NodeId) -> Result<bool, EngineError> {
    Ok(size_of(snapshot, id)? > 0)
}

/// Number of live nodes.
pub fn live_count(snapshot: &Snapshot) -> Result<u64, EngineError> {
    tables::counter(&snapshot.table(META)?, meta::NODES)
}

/// Read up to `limit` live node ids after `after`, as a page of
/// big-endian ids.
pub fn page(
    snapshot: &Snapshot,
    after: Option<NodeId>,
    limit: usize,
) -> Result<Multi<'static>, EngineError> {
    let sizes = snapshot.table(NODE_SIZES)?;
    let lower = after.map_or(Bound::Unbounded, |id| Bound::Excluded(id.0));
    let range = sizes
        .range::<u64>((lower, Bound::Unbounded))
        .map_err(redb_error("scan nodes"))?;

    let mut page = Multi::empty(Stride(NODE_ID_LEN))?;
    for entry in range.take(limit) {
        let (id, _) = entry.map_err(redb_error("scan nodes"))?;
        page = page.append(&NodeId(id.value()).to_bytes())?;
    }
    Ok(page)
}
