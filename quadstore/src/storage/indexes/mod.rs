//! Index implementations for the quad store.
//!
//! Indexes provide efficient access patterns for quad data:
//! - Primary index: quad key -> horizon of the add ([`PrimaryIndex`])
//! - Position orders: one duplicate-sorted table per quad position, keyed
//!   by the node id at that position, plus a composite subject-predicate
//!   order ([`IndexSet`])
//!
//! # Key Format
//!
//! Every order stores `prefix || quad key`, where the prefix is the
//! big-endian id (or ids) the order is keyed by and the quad key is the
//! 32-byte subject, predicate, object, label encoding. The duplicates under
//! one prefix are therefore fixed-stride values and can be bulk-read as one
//! [`Multi`](crate::storage::Multi) page.

mod order;
mod primary;

pub use order::IndexOrder;
pub use primary::PrimaryIndex;

use redb::{ReadableTable, WriteTransaction};

use crate::storage::engine::{EngineError, Snapshot, redb_error};
use crate::storage::multi::{Multi, Stride};
use crate::storage::tables::INDEX_COUNTS;
use crate::types::{QUAD_KEY_LEN, QuadKey};

/// The set of position orders maintained for every live quad.
pub struct IndexSet;

impl IndexSet {
    /// Add `key` to every order.
    ///
    /// Returns the number of entries that were newly inserted.
    pub fn add(txn: &WriteTransaction, key: &QuadKey) -> Result<usize, EngineError> {
        let mut added = 0;
        for order in IndexOrder::ALL {
            if Self::add_entry(txn, order, key)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Remove `key` from every order.
    ///
    /// Returns the number of entries that were actually present.
    pub fn remove(txn: &WriteTransaction, key: &QuadKey) -> Result<usize, EngineError> {
        let mut removed = 0;
        for order in IndexOrder::ALL {
            if Self::remove_entry(txn, order, key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Insert one index entry. An identical existing entry is left alone
    /// and reported as `false`.
    pub fn add_entry(
        txn: &WriteTransaction,
        order: IndexOrder,
        key: &QuadKey,
    ) -> Result<bool, EngineError> {
        let entry = order.entry(key);
        let mut table = txn
            .open_table(order.table())
            .map_err(redb_error("open index"))?;
        let existed = table
            .insert(entry.as_slice(), ())
            .map_err(redb_error("add index entry"))?
            .is_some();
        drop(table);

        if existed {
            return Ok(false);
        }
        adjust_count(txn, &order.count_key(&order.prefix(key)), 1)?;
        Ok(true)
    }

    /// Remove one index entry. A missing entry is a soft miss reported as
    /// `false`.
    pub fn remove_entry(
        txn: &WriteTransaction,
        order: IndexOrder,
        key: &QuadKey,
    ) -> Result<bool, EngineError> {
        let entry = order.entry(key);
        let mut table = txn
            .open_table(order.table())
            .map_err(redb_error("open index"))?;
        let existed = table
            .remove(entry.as_slice())
            .map_err(redb_error("remove index entry"))?
            .is_some();
        drop(table);

        if !existed {
            tracing::debug!(%order, %key, "index entry already absent");
            return Ok(false);
        }
        adjust_count(txn, &order.count_key(&order.prefix(key)), -1)?;
        Ok(true)
    }

    /// Bulk-read the quad keys stored under `prefix` in `order`.
    ///
    /// Resumes strictly after `after` and returns at most `limit` keys, in
    /// ascending quad key order.
    pub fn scan(
        snapshot: &Snapshot,
        order: IndexOrder,
        prefix: &[u8],
        after: Option<&[u8]>,
        limit: usize,
    ) -> Result<Multi<'static>, EngineError> {
        snapshot.get_multiple(order.table(), prefix, after, Stride(QUAD_KEY_LEN), limit)
    }

    /// Returns `true` if `order` holds an entry for `key`.
    pub fn contains(
        snapshot: &Snapshot,
        order: IndexOrder,
        key: &QuadKey,
    ) -> Result<bool, EngineError> {
        let table = snapshot.table(order.table())?;
        let entry = order.entry(key);
        Ok(table
            .get(entry.as_slice())
            .map_err(redb_error("probe index"))?
            .is_some())
    }

    /// Number of entries stored under `prefix` in `order`.
    pub fn count(
        snapshot: &Snapshot,
        order: IndexOrder,
        prefix: &[u8],
    ) -> Result<u64, EngineError> {
        let counts = snapshot.table(INDEX_COUNTS)?;
        let count_key = order.count_key(prefix);
        Ok(counts
            .get(count_key.as_slice())
            .map_err(redb_error("read index count"))?
            .map_or(0, |guard| guard.value()))
    }
}

fn adjust_count(txn: &WriteTransaction, count_key: &[u8], delta: i64) -> Result<(), EngineError> {
    let mut counts = txn
        .open_table(INDEX_COUNTS)
        .map_err(redb_error("open index counts"))?;
    let current = counts
        .get(count_key)
        .map_err(redb_error("read index count"))?
        .map_or(0, |guard| guard.value());
    let updated = current.saturating_add_signed(delta);
    if updated == 0 {
        counts
            .remove(count_key)
            .map_err(redb_error("drop index count"))?;
    } else {
        counts
            .insert(count_key, updated)
            .map_err(redb_error("write index count"))?;
    }
    Ok(())
}
