//! Restartable paged scans.
//!
//! A [`ScanCursor`] walks one source (live nodes, live quads, or the
//! duplicates under one index prefix) a page at a time. It opens a read
//! snapshot on the first fetch and keeps it until the source is exhausted
//! or the cursor is reset, so one pass sees one consistent view. Reset only
//! drops state; the next fetch re-seeks from the start.
//!
//! Composite iterators hand one snapshot to every cursor beneath them with
//! [`ScanCursor::set_snapshot`], so a whole tree reads a single view.

use std::sync::Arc;

use crate::storage::nodes;
use crate::storage::{Engine, IndexOrder, IndexSet, Multi, PrimaryIndex, Snapshot, StoreError};
use crate::types::{NodeId, QuadKey, Ref};

/// What a cursor scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanSource {
    Nodes,
    Quads,
    Index { order: IndexOrder, prefix: Vec<u8> },
}

pub struct ScanCursor {
    engine: Arc<Engine>,
    source: ScanSource,
    page_size: usize,
    snapshot: Option<Arc<Snapshot>>,
    page: Option<Multi<'static>>,
    pos: usize,
    exhausted: bool,
}

impl ScanCursor {
    pub fn new(engine: Arc<Engine>, source: ScanSource, page_size: usize) -> Self {
        Self {
            engine,
            source,
            page_size: page_size.max(1),
            snapshot: None,
            page: None,
            pos: 0,
            exhausted: false,
        }
    }

    pub const fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns `true` while a snapshot is held.
    pub const fn is_open(&self) -> bool {
        self.snapshot.is_some()
    }

    /// The next value, or `None` once the source is exhausted.
    pub fn next(&mut self) -> Result<Option<Ref>, StoreError> {
        loop {
            if let Some(page) = &self.page
                && let Some(value) = page.get(self.pos)
            {
                self.pos += 1;
                return decode(&self.source, value).map(Some);
            }

            if self.exhausted {
                self.snapshot = None;
                return Ok(None);
            }
            self.fetch()?;
        }
    }

    fn fetch(&mut self) -> Result<(), StoreError> {
        if self.snapshot.is_none() {
            self.snapshot = Some(Arc::new(self.engine.begin_read()?));
        }
        let Some(snapshot) = &self.snapshot else {
            return Ok(());
        };

        let after = self.page.as_ref().and_then(Multi::last);
        let page = match &self.source {
            ScanSource::Nodes => {
                let after = after.and_then(NodeId::from_bytes);
                nodes::page(snapshot, after, self.page_size)?
            }
            ScanSource::Quads => {
                let after = after.and_then(QuadKey::from_bytes);
                PrimaryIndex::page(snapshot, after.as_ref(), self.page_size)?
            }
            ScanSource::Index { order, prefix } => {
                IndexSet::scan(snapshot, *order, prefix, after, self.page_size)?
            }
        };

        if page.len() < self.page_size {
            self.exhausted = true;
        }
        self.page = Some(page);
        self.pos = 0;
        Ok(())
    }

    /// Run `f` against the held snapshot, or a temporary one when the
    /// cursor has not started.
    pub fn with_snapshot<T>(
        &self,
        f: impl FnOnce(&Snapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if let Some(snapshot) = &self.snapshot {
            return f(snapshot.as_ref());
        }
        let snapshot = self.engine.begin_read()?;
        f(&snapshot)
    }

    /// Read through `snapshot` from now on, or release the held snapshot
    /// when `None`.
    pub fn set_snapshot(&mut self, snapshot: Option<&Arc<Snapshot>>) {
        self.snapshot = snapshot.cloned();
    }

    /// Drop the snapshot and any buffered page.
    pub fn reset(&mut self) {
        self.snapshot = None;
        self.page = None;
        self.pos = 0;
        self.exhausted = false;
    }
}

impl Clone for ScanCursor {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.engine), self.source.clone(), self.page_size)
    }
}

impl std::fmt::Debug for ScanCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCursor")
            .field("source", &self.source)
            .field("page_size", &self.page_size)
            .field("open", &self.is_open())
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

fn decode(source: &ScanSource, value: &[u8]) -> Result<Ref, StoreError> {
    let decoded = match source {
        ScanSource::Nodes => NodeId::from_bytes(value).map(Ref::Node),
        ScanSource::Quads | ScanSource::Index { .. } => QuadKey::from_bytes(value).map(Ref::Quad),
    };
    decoded.ok_or_else(|| StoreError::Corrupt(format!("undecodable scan value {value:02x?}")))
}
