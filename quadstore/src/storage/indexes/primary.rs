//! Primary index implementation.
//!
//! The primary index maps the 32-byte quad key to the horizon at which the
//! quad was added. Presence in this table is what makes a quad live.

use std::ops::Bound;

use redb::{ReadableTable, Table, WriteTransaction};

use crate::storage::engine::{EngineError, Snapshot, redb_error};
use crate::storage::multi::{Multi, Stride};
use crate::storage::tables::QUADS;
use crate::types::{Horizon, QUAD_KEY_LEN, QuadKey};

/// Primary index over a write transaction.
///
/// Maps quad key -> `Horizon`.
pub struct PrimaryIndex<'txn> {
    table: Table<'txn, &'static [u8], u64>,
}

impl<'txn> PrimaryIndex<'txn> {
    /// Open the primary index inside `txn`.
    pub fn open(txn: &'txn WriteTransaction) -> Result<Self, EngineError> {
        let table = txn.open_table(QUADS).map_err(redb_error("open quads"))?;
        Ok(Self { table })
    }

    /// Look up the horizon of a live quad.
    pub fn get(&self, key: &QuadKey) -> Result<Option<Horizon>, EngineError> {
        let bytes = key.to_bytes();
        Ok(self
            .table
            .get(bytes.as_slice())
            .map_err(redb_error("read quad"))?
            .map(|guard| Horizon(guard.value())))
    }

    /// Insert a quad added at `horizon`.
    ///
    /// Returns the existing horizon without overwriting when the quad is
    /// already live.
    pub fn insert(
        &mut self,
        key: &QuadKey,
        horizon: Horizon,
    ) -> Result<Option<Horizon>, EngineError> {
        if let Some(existing) = self.get(key)? {
            return Ok(Some(existing));
        }
        let bytes = key.to_bytes();
        self.table
            .insert(bytes.as_slice(), horizon.get())
            .map_err(redb_error("write quad"))?;
        Ok(None)
    }

    /// Remove a quad. Returns the horizon it was added at, if it was live.
    pub fn remove(&mut self, key: &QuadKey) -> Result<Option<Horizon>, EngineError> {
        let bytes = key.to_bytes();
        Ok(self
            .table
            .remove(bytes.as_slice())
            .map_err(redb_error("remove quad"))?
            .map(|guard| Horizon(guard.value())))
    }

    /// Horizon of a live quad as seen by `snapshot`.
    pub fn horizon_of(snapshot: &Snapshot, key: &QuadKey) -> Result<Option<Horizon>, EngineError> {
        let table = snapshot.table(QUADS)?;
        let bytes = key.to_bytes();
        Ok(table
            .get(bytes.as_slice())
            .map_err(redb_error("read quad"))?
            .map(|guard| Horizon(guard.value())))
    }

    /// Returns `true` if `key` is live in `snapshot`.
    pub fn contains(snapshot: &Snapshot, key: &QuadKey) -> Result<bool, EngineError> {
        Ok(Self::horizon_of(snapshot, key)?.is_some())
    }

    /// Read up to `limit` live quad keys after `after`, in key order.
    pub fn page(
        snapshot: &Snapshot,
        after: Option<&QuadKey>,
        limit: usize,
    ) -> Result<Multi<'static>, EngineError> {
        let table = snapshot.table(QUADS)?;
        let start = after.map(QuadKey::to_bytes);
        let lower = start
            .as_ref()
            .map_or(Bound::Unbounded, |bytes| Bound::Excluded(bytes.as_slice()));
        let range = table
            .range::<&[u8]>((lower, Bound::Unbounded))
            .map_err(redb_error("scan quads"))?;

        let mut page = Multi::empty(Stride(QUAD_KEY_LEN))?;
        for entry in range.take(limit) {
            let (key, _) = entry.map_err(redb_error("scan quads"))?;
            page = page.append(key.value())?;
        }
        Ok(page)
    }
}
