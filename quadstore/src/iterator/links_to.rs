use std::sync::Arc;

use crate::iterator::{
    Base, FixedIterator, GraphIterator, PositionIterator, SizeHint, TagMap, Tagger,
};
use crate::storage::{Engine, IndexOrder, IndexSet, PrimaryIndex, Snapshot, StoreError};
use crate::types::{Direction, QuadKey, Ref};

/// Estimated quads per node when the primary's exact contents are unknown.
pub const FAN_OUT: u64 = 20;

/// Quads whose value at `direction` is one of the nodes produced by a
/// primary iterator.
///
/// For each primary node, a position scan yields the matching quads before
/// the primary advances. One snapshot, opened on the first `next`, serves
/// the primary and every per-node scan of a pass.
#[derive(Debug)]
pub struct LinksTo {
    base: Base,
    engine: Arc<Engine>,
    page_size: usize,
    direction: Direction,
    primary: Box<GraphIterator>,
    inner: Option<PositionIterator>,
    snapshot: Option<Arc<Snapshot>>,
}

impl LinksTo {
    #[must_use]
    pub fn new(
        engine: Arc<Engine>,
        page_size: usize,
        primary: GraphIterator,
        direction: Direction,
    ) -> Self {
        Self {
            base: Base::default(),
            engine,
            page_size,
            direction,
            primary: Box::new(primary),
            inner: None,
            snapshot: None,
        }
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn primary(&self) -> &GraphIterator {
        &self.primary
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, StoreError> {
        if self.base.is_exhausted() {
            return Ok(false);
        }
        if self.snapshot.is_none() {
            let snapshot = Arc::new(self.engine.begin_read()?);
            self.set_snapshot(Some(&snapshot));
        }
        loop {
            if let Some(inner) = &mut self.inner {
                if inner.next()? {
                    if let Some(result) = inner.result() {
                        self.base.advance(result);
                        return Ok(true);
                    }
                    continue;
                }
                self.inner = None;
            }

            if !self.primary.next()? {
                self.base.exhaust();
                self.set_snapshot(None);
                return Ok(false);
            }
            if let Some(Ref::Node(id)) = self.primary.result() {
                let mut inner = PositionIterator::new(
                    Arc::clone(&self.engine),
                    self.page_size,
                    self.direction,
                    id,
                );
                inner.set_snapshot(self.snapshot.as_ref());
                self.inner = Some(inner);
            }
        }
    }

    #[must_use]
    pub const fn result(&self) -> Option<Ref> {
        self.base.result()
    }

    /// Outside a pass, the liveness check and the primary probe share one
    /// temporary snapshot.
    pub fn contains(&mut self, value: Ref) -> Result<bool, StoreError> {
        let Ref::Quad(key) = value else {
            return Ok(false);
        };
        let temporary = self.snapshot.is_none();
        if temporary {
            let snapshot = Arc::new(self.engine.begin_read()?);
            self.set_snapshot(Some(&snapshot));
        }
        let found = self.probe(&key);
        if temporary {
            self.set_snapshot(None);
        }
        if found? {
            self.base.set_result(value);
            return Ok(true);
        }
        Ok(false)
    }

    fn probe(&mut self, key: &QuadKey) -> Result<bool, StoreError> {
        let live = match &self.snapshot {
            Some(snapshot) => PrimaryIndex::contains(snapshot, key)?,
            None => false,
        };
        Ok(live && self.primary.contains(Ref::Node(key.get(self.direction)))?)
    }

    /// Exact when the primary is a fixed set, otherwise the primary's size
    /// times [`FAN_OUT`].
    pub fn size(&self) -> Result<SizeHint, StoreError> {
        if let GraphIterator::Fixed(fixed) = self.primary.as_ref() {
            let order = IndexOrder::for_direction(self.direction);
            let snapshot = self.engine.begin_read()?;
            let mut total = 0;
            for value in fixed.values() {
                if let Ref::Node(id) = value {
                    total += IndexSet::count(&snapshot, order, &id.to_bytes())?;
                }
            }
            return Ok(SizeHint::exact(total));
        }
        let primary = self.primary.size()?;
        Ok(SizeHint::estimate(primary.value.saturating_mul(FAN_OUT)))
    }

    pub fn tag_results(&self, dst: &mut TagMap) {
        self.base.tag_results(dst);
        self.primary.tag_results(dst);
    }

    pub fn reset(&mut self) {
        self.base.reset();
        self.primary.reset();
        self.inner = None;
        self.snapshot = None;
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: Option<&Arc<Snapshot>>) {
        self.snapshot = snapshot.cloned();
        self.primary.set_snapshot(snapshot);
        if let Some(inner) = &mut self.inner {
            inner.set_snapshot(snapshot);
        }
    }

    pub(crate) const fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Fold a fixed primary into a direct index scan.
    ///
    /// A single-node set becomes one position scan; an empty set becomes an
    /// empty fixed set. Otherwise the primary is optimized in place.
    pub fn optimize(mut self) -> (GraphIterator, bool) {
        if let GraphIterator::Fixed(fixed) = self.primary.as_ref() {
            match fixed.values() {
                [] => {
                    tracing::debug!("optimized links-to over empty set into empty fixed");
                    let mut empty = FixedIterator::new();
                    empty.tagger_mut().copy_from(&self.base.tagger);
                    return (empty.into(), true);
                }
                [Ref::Node(id)] => {
                    tracing::debug!("optimized links-to {id} into {} scan", self.direction);
                    let mut scan = PositionIterator::new(
                        Arc::clone(&self.engine),
                        self.page_size,
                        self.direction,
                        *id,
                    );
                    let tagger = scan.tagger_mut();
                    tagger.copy_from(&self.base.tagger);
                    for tag in fixed.tagger().tags() {
                        tagger.add_fixed(tag.clone(), Ref::Node(*id));
                    }
                    for (tag, value) in fixed.tagger().fixed() {
                        tagger.add_fixed(tag.clone(), *value);
                    }
                    return (scan.into(), true);
                }
                _ => {}
            }
        }

        let (primary, changed) = (*self.primary).optimize();
        self.primary = Box::new(primary);
        self.inner = None;
        self.snapshot = None;
        self.base.reset();
        (self.into(), changed)
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

impl Clone for LinksTo {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            engine: Arc::clone(&self.engine),
            page_size: self.page_size,
            direction: self.direction,
            primary: self.primary.clone(),
            inner: None,
            snapshot: None,
        }
    }
}
