use std::sync::Arc;

use crate::iterator::cursor::{ScanCursor, ScanSource};
use crate::iterator::{Base, Category, SizeHint, TagMap, Tagger};
use crate::storage::nodes;
use crate::storage::tables::{self, META, meta};
use crate::storage::{Engine, PrimaryIndex, Snapshot, StoreError};
use crate::types::Ref;

/// Every live node, or every live quad, in key order.
#[derive(Debug, Clone)]
pub struct AllIterator {
    base: Base,
    category: Category,
    cursor: ScanCursor,
}

impl AllIterator {
    #[must_use]
    pub fn nodes(engine: Arc<Engine>, page_size: usize) -> Self {
        Self::new(engine, page_size, Category::Nodes)
    }

    #[must_use]
    pub fn quads(engine: Arc<Engine>, page_size: usize) -> Self {
        Self::new(engine, page_size, Category::Quads)
    }

    fn new(engine: Arc<Engine>, page_size: usize, category: Category) -> Self {
        let source = match category {
            Category::Nodes => ScanSource::Nodes,
            Category::Quads => ScanSource::Quads,
        };
        Self {
            base: Base::default(),
            category,
            cursor: ScanCursor::new(engine, source, page_size),
        }
    }

    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    pub(crate) const fn engine(&self) -> &Arc<Engine> {
        self.cursor.engine()
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
        let found = match (self.category, value) {
            (Category::Nodes, Ref::Node(id)) => {
                self.cursor.with_snapshot(|s| Ok(nodes::is_live(s, id)?))?
            }
            (Category::Quads, Ref::Quad(key)) => {
                self.cursor.with_snapshot(|s| Ok(PrimaryIndex::contains(s, &key)?))?
            }
            _ => false,
        };
        if found {
            self.base.set_result(value);
        }
        Ok(found)
    }

    /// Exact live node or quad count.
    pub fn size(&self) -> Result<SizeHint, StoreError> {
        let counter = match self.category {
            Category::Nodes => meta::NODES,
            Category::Quads => meta::SIZE,
        };
        let value = self
            .cursor
            .with_snapshot(|s| Ok(tables::counter(&s.table(META)?, counter)?))?;
        Ok(SizeHint::exact(value))
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
