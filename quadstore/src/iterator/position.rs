use std::sync::Arc;

use crate::iterator::cursor::{ScanCursor, ScanSource};
use crate::iterator::{Base, SizeHint, TagMap, Tagger};
use crate::storage::{Engine, IndexOrder, IndexSet, Snapshot, StoreError};
use crate::types::{Direction, NodeId, Ref};

/// Quads with fixed ids at one or two positions, read from a single index
/// order.
///
/// The single-position form scans the order keyed by that position. The
/// subject-predicate form scans the composite order, which only the
/// optimizer builds.
#[derive(Debug, Clone)]
pub struct PositionIterator {
    base: Base,
    order: IndexOrder,
    bound: Vec<(Direction, NodeId)>,
    prefix: Vec<u8>,
    cursor: ScanCursor,
}

impl PositionIterator {
    #[must_use]
    pub fn new(engine: Arc<Engine>, page_size: usize, direction: Direction, id: NodeId) -> Self {
        Self::scan(
            engine,
            page_size,
            IndexOrder::for_direction(direction),
            vec![(direction, id)],
        )
    }

    /// Quads with `subject` and `predicate` both fixed.
    #[must_use]
    pub fn subject_predicate(
        engine: Arc<Engine>,
        page_size: usize,
        subject: NodeId,
        predicate: NodeId,
    ) -> Self {
        Self::scan(
            engine,
            page_size,
            IndexOrder::SubjectPredicate,
            vec![(Direction::Subject, subject), (Direction::Predicate, predicate)],
        )
    }

    fn scan(
        engine: Arc<Engine>,
        page_size: usize,
        order: IndexOrder,
        bound: Vec<(Direction, NodeId)>,
    ) -> Self {
        let prefix: Vec<u8> = bound.iter().flat_map(|(_, id)| id.to_bytes()).collect();
        let source = ScanSource::Index {
            order,
            prefix: prefix.clone(),
        };
        Self {
            base: Base::default(),
            order,
            bound,
            prefix,
            cursor: ScanCursor::new(engine, source, page_size),
        }
    }

    #[must_use]
    pub const fn order(&self) -> IndexOrder {
        self.order
    }

    /// The fixed (position, id) pairs every result matches.
    #[must_use]
    pub fn bound(&self) -> &[(Direction, NodeId)] {
        &self.bound
    }

    /// The id fixed at `direction`, when this scan is keyed by that
    /// position alone.
    #[must_use]
    pub fn single(&self, direction: Direction) -> Option<NodeId> {
        match self.bound.as_slice() {
            [(d, id)] if *d == direction => Some(*id),
            _ => None,
        }
    }

    pub(crate) const fn engine(&self) -> &Arc<Engine> {
        self.cursor.engine()
    }

    pub(crate) const fn page_size(&self) -> usize {
        self.cursor.page_size()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, StoreError> {
        if self.base.is_exhausted() {
            return Ok(false);
        }
        match self.cursor.next()? {
            Some(result) => {
                self.base.advance(result);
                Ok(true)
            }
            None => {
                self.base.exhaust();
                Ok(false)
            }
        }
    }

    #[must_use]
    pub const fn result(&self) -> Option<Ref> {
        self.base.result()
    }

    pub fn contains(&mut self, value: Ref) -> Result<bool, StoreError> {
        let Ref::Quad(key) = value else {
            return Ok(false);
        };
        if !self.bound.iter().all(|(d, id)| key.get(*d) == *id) {
            return Ok(false);
        }
        let order = self.order;
        let found = self
            .cursor
            .with_snapshot(|s| Ok(IndexSet::contains(s, order, &key)?))?;
        if found {
            self.base.set_result(value);
        }
        Ok(found)
    }

    /// Exact number of entries under this scan's prefix.
    pub fn size(&self) -> Result<SizeHint, StoreError> {
        let order = self.order;
        let prefix = &self.prefix;
        let count = self
            .cursor
            .with_snapshot(|s| Ok(IndexSet::count(s, order, prefix)?))?;
        Ok(SizeHint::exact(count))
    }

    pub fn tag_results(&self, dst: &mut TagMap) {
        self.base.tag_results(dst);
    }

    pub fn reset(&mut self) {
        self.base.reset();
        self.cursor.reset();
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: Option<&Arc<Snapshot>>) {
        self.cursor.set_snapshot(snapshot);
    }

    #[must_use]
    pub const fn tagger(&self) -> &Tagger {
        &self.base.tagger
    }

    pub const fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.base.tagger
    }

    pub(crate) const fn base(&self) -> &Base {
        &self.base
    }
}
