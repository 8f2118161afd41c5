use std::sync::Arc;

use crate::iterator::{
    Base, Category, GraphIterator, IteratorType, PositionIterator, SizeHint, TagMap, Tagger,
};
use crate::storage::{Engine, Snapshot, StoreError};
use crate::types::{Direction, Ref};

/// Intersection of its children.
///
/// The child with the smallest size hint drives iteration; every value it
/// yields is probed against the others with `contains`. Which child drives
/// is decided on the first `next` and only affects cost, never results.
///
/// The driver's scan and every probe of one pass read the same snapshot.
#[derive(Debug, Default)]
pub struct And {
    base: Base,
    children: Vec<GraphIterator>,
    driver: Option<usize>,
    snapshot: Option<Arc<Snapshot>>,
}

impl And {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, child: impl Into<GraphIterator>) {
        self.children.push(child.into());
        self.driver = None;
    }

    #[must_use]
    pub fn with(mut self, child: impl Into<GraphIterator>) -> Self {
        self.add(child);
        self
    }

    #[must_use]
    pub fn children(&self) -> &[GraphIterator] {
        &self.children
    }

    /// The category of the first child that has one.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        self.children.iter().find_map(GraphIterator::category)
    }

    fn choose_driver(&self) -> Result<usize, StoreError> {
        let mut best = 0;
        let mut best_size = u64::MAX;
        for (i, child) in self.children.iter().enumerate() {
            let size = child.size()?.value;
            if size < best_size {
                best = i;
                best_size = size;
            }
        }
        Ok(best)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, StoreError> {
        if self.base.is_exhausted() {
            return Ok(false);
        }
        if self.children.is_empty() {
            self.base.exhaust();
            return Ok(false);
        }
        if self.snapshot.is_none() {
            self.open_snapshot()?;
        }
        let driver = match self.driver {
            Some(driver) => driver,
            None => {
                let driver = self.choose_driver()?;
                self.driver = Some(driver);
                driver
            }
        };

        'outer: loop {
            if !self.children[driver].next()? {
                self.base.exhaust();
                self.set_snapshot(None);
                return Ok(false);
            }
            let Some(candidate) = self.children[driver].result() else {
                continue;
            };
            for (i, child) in self.children.iter_mut().enumerate() {
                if i != driver && !child.contains(candidate)? {
                    continue 'outer;
                }
            }
            self.base.advance(candidate);
            return Ok(true);
        }
    }

    #[must_use]
    pub const fn result(&self) -> Option<Ref> {
        self.base.result()
    }

    /// Outside a pass, every child is probed through one temporary
    /// snapshot.
    pub fn contains(&mut self, value: Ref) -> Result<bool, StoreError> {
        if self.children.is_empty() {
            return Ok(false);
        }
        let temporary = self.snapshot.is_none();
        if temporary {
            self.open_snapshot()?;
        }
        let found = self.probe_all(value);
        if temporary {
            self.set_snapshot(None);
        }
        if found? {
            self.base.set_result(value);
            return Ok(true);
        }
        Ok(false)
    }

    fn probe_all(&mut self, value: Ref) -> Result<bool, StoreError> {
        for child in &mut self.children {
            if !child.contains(value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn open_snapshot(&mut self) -> Result<(), StoreError> {
        let Some(engine) = self.engine() else {
            return Ok(());
        };
        let snapshot = Arc::new(engine.begin_read()?);
        self.set_snapshot(Some(&snapshot));
        Ok(())
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: Option<&Arc<Snapshot>>) {
        self.snapshot = snapshot.cloned();
        for child in &mut self.children {
            child.set_snapshot(snapshot);
        }
    }

    /// The engine of the first child that reads the store.
    pub(crate) fn engine(&self) -> Option<&Arc<Engine>> {
        self.children.iter().find_map(GraphIterator::engine)
    }

    /// The smallest child size. Exact only with a single exact child.
    pub fn size(&self) -> Result<SizeHint, StoreError> {
        match self.children.as_slice() {
            [] => Ok(SizeHint::exact(0)),
            [only] => only.size(),
            children => {
                let mut smallest = u64::MAX;
                for child in children {
                    smallest = smallest.min(child.size()?.value);
                }
                Ok(SizeHint::estimate(smallest))
            }
        }
    }

    pub fn tag_results(&self, dst: &mut TagMap) {
        self.base.tag_results(dst);
        for child in &self.children {
            child.tag_results(dst);
        }
    }

    pub fn reset(&mut self) {
        self.base.reset();
        for child in &mut self.children {
            child.reset();
        }
        self.driver = None;
        self.snapshot = None;
    }

    /// Optimize the children, then simplify the intersection.
    ///
    /// - `All` children whose category another child already constrains are
    ///   dropped; their tags move onto the intersection.
    /// - A subject scan and a predicate scan fuse into one scan of the
    ///   subject-predicate order.
    /// - A single remaining child replaces the intersection and takes its
    ///   tags.
    pub fn optimize(mut self) -> (GraphIterator, bool) {
        let mut changed = false;
        let mut children = Vec::with_capacity(self.children.len());
        for child in self.children.drain(..) {
            let (child, child_changed) = child.optimize();
            changed |= child_changed;
            children.push(child);
        }

        changed |= self.drop_redundant_all(&mut children);
        changed |= fuse_subject_predicate(&mut children);

        self.base.reset();
        self.driver = None;
        self.snapshot = None;
        if children.len() == 1
            && let Some(mut only) = children.pop()
        {
            tracing::debug!(
                "collapsed single-child intersection into {}",
                only.iterator_type()
            );
            only.tagger_mut().copy_from(&self.base.tagger);
            return (only, true);
        }
        self.children = children;
        (self.into(), changed)
    }

    /// An `All` child only filters for liveness, so it is redundant next to
    /// a child whose results are already live. A fixed set is not: it may
    /// hold ids whose last quad is gone.
    fn drop_redundant_all(&mut self, children: &mut Vec<GraphIterator>) -> bool {
        let constrained: Vec<Category> = children
            .iter()
            .filter(|child| child.iterator_type() != IteratorType::All && yields_live(child))
            .filter_map(GraphIterator::category)
            .collect();

        let before = children.len();
        let tagger = &mut self.base.tagger;
        children.retain(|child| {
            let redundant = child.iterator_type() == IteratorType::All
                && child
                    .category()
                    .is_some_and(|category| constrained.contains(&category));
            if redundant {
                tagger.copy_from(child.tagger());
            }
            !redundant
        });
        let dropped = before - children.len();
        if dropped > 0 {
            tracing::debug!("dropped {dropped} redundant all iterators from intersection");
        }
        dropped > 0
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

impl Clone for And {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            children: self.children.clone(),
            driver: None,
            snapshot: None,
        }
    }
}

/// Returns `true` if every result of `it` is a live node or quad.
fn yields_live(it: &GraphIterator) -> bool {
    match it {
        GraphIterator::All(_) | GraphIterator::Position(_) | GraphIterator::LinksTo(_) => true,
        GraphIterator::Fixed(_) => false,
        GraphIterator::And(and) => and.children().iter().any(yields_live),
    }
}

/// Replace one subject scan and one predicate scan with a single scan of
/// the composite order.
fn fuse_subject_predicate(children: &mut Vec<GraphIterator>) -> bool {
    let find = |children: &[GraphIterator], direction: Direction| {
        children.iter().position(|child| match child {
            GraphIterator::Position(scan) => scan.single(direction).is_some(),
            _ => false,
        })
    };
    let (Some(s), Some(p)) = (
        find(children, Direction::Subject),
        find(children, Direction::Predicate),
    ) else {
        return false;
    };

    // Remove the higher index first so the lower one stays valid.
    let (first, second) = if s > p { (s, p) } else { (p, s) };
    let a = children.remove(first);
    let b = children.remove(second);
    let (GraphIterator::Position(a), GraphIterator::Position(b)) = (a, b) else {
        return false;
    };
    let (subject_scan, predicate_scan) = if s > p { (a, b) } else { (b, a) };
    let (Some(subject), Some(predicate)) = (
        subject_scan.single(Direction::Subject),
        predicate_scan.single(Direction::Predicate),
    ) else {
        return false;
    };

    let mut fused = PositionIterator::subject_predicate(
        Arc::clone(subject_scan.engine()),
        subject_scan.page_size(),
        subject,
        predicate,
    );
    fused.tagger_mut().copy_from(subject_scan.tagger());
    fused.tagger_mut().copy_from(predicate_scan.tagger());
    tracing::debug!("fused subject {subject} and predicate {predicate} scans");
    children.push(fused.into());
    true
}
