//! Composable query iterators over a quad store.
//!
//! Every iterator is one variant of [`GraphIterator`] and shares the same
//! state machine: *Unstarted* until the first `next`, *Iterating* while it
//! yields results, *Exhausted* once `next` returns `false`. `reset` returns
//! it to *Unstarted* and the next pass starts from the beginning.
//!
//! Iterators that read the store open a read snapshot on their first
//! `next` and hold it until exhausted or reset. Composite iterators open one
//! snapshot for the whole pass and hand it to every sub-iterator, so scans
//! and membership probes beneath them read the same view. A `contains` call
//! on an unstarted iterator uses a temporary snapshot for that call only.
//!
//! # Usage
//!
//! ```no_run
//! use quadstore::config::StoreConfig;
//! use quadstore::iterator::GraphIterator;
//! use quadstore::storage::QuadStore;
//! use quadstore::types::Direction;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = QuadStore::open("graph.redb".as_ref(), &StoreConfig::default())?;
//! let c = store.value_of("C")?;
//! let b = store.value_of("B")?;
//!
//! let mut and = store.and();
//! and.add(store.quad_iterator(Direction::Subject, c));
//! and.add(store.quad_iterator(Direction::Object, b));
//!
//! let (mut it, _) = GraphIterator::from(and).optimize();
//! while it.next()? {
//!     if let Some(result) = it.result() {
//!         println!("{}", store.quad(result)?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod all;
mod and;
mod cursor;
mod fixed;
mod links_to;
mod position;
mod tagger;

use std::fmt;
use std::sync::Arc;

pub use all::AllIterator;
pub use and::And;
pub use fixed::FixedIterator;
pub use links_to::{FAN_OUT, LinksTo};
pub use position::PositionIterator;
pub use tagger::{TagMap, Tagger};

use crate::storage::{Engine, Snapshot, StoreError};
use crate::types::Ref;

/// Which variant an iterator is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IteratorType {
    All,
    Fixed,
    Position,
    LinksTo,
    And,
}

impl fmt::Display for IteratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Fixed => "fixed",
            Self::Position => "position",
            Self::LinksTo => "links_to",
            Self::And => "and",
        };
        f.write_str(name)
    }
}

/// Whether an iterator yields nodes or quads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Nodes,
    Quads,
}

impl Category {
    #[must_use]
    pub const fn of(value: &Ref) -> Self {
        match value {
            Ref::Node(_) => Self::Nodes,
            Ref::Quad(_) => Self::Quads,
        }
    }
}

/// Lifecycle of an iterator pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Unstarted,
    Iterating,
    Exhausted,
}

/// A cardinality hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeHint {
    pub value: u64,
    /// `true` when `value` is the exact number of results.
    pub exact: bool,
}

impl SizeHint {
    #[must_use]
    pub const fn exact(value: u64) -> Self {
        Self { value, exact: true }
    }

    #[must_use]
    pub const fn estimate(value: u64) -> Self {
        Self {
            value,
            exact: false,
        }
    }
}

/// State shared by every variant.
#[derive(Debug, Default)]
pub(crate) struct Base {
    pub(crate) tagger: Tagger,
    state: State,
    result: Option<Ref>,
}

impl Base {
    pub(crate) const fn state(&self) -> State {
        self.state
    }

    pub(crate) const fn result(&self) -> Option<Ref> {
        self.result
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    pub(crate) const fn advance(&mut self, result: Ref) {
        self.state = State::Iterating;
        self.result = Some(result);
    }

    /// Record a value confirmed by `contains` as the current result.
    pub(crate) const fn set_result(&mut self, result: Ref) {
        self.result = Some(result);
    }

    pub(crate) const fn exhaust(&mut self) {
        self.state = State::Exhausted;
        self.result = None;
    }

    pub(crate) const fn reset(&mut self) {
        self.state = State::Unstarted;
        self.result = None;
    }

    pub(crate) fn tag_results(&self, dst: &mut TagMap) {
        self.tagger.tag_result(dst, self.result);
    }
}

impl Clone for Base {
    /// Keeps the tags and drops any progress.
    fn clone(&self) -> Self {
        Self {
            tagger: self.tagger.clone(),
            state: State::Unstarted,
            result: None,
        }
    }
}

/// Any iterator of the algebra.
///
/// Cloning yields an unstarted iterator with the same definition and tags.
#[derive(Debug, Clone)]
pub enum GraphIterator {
    All(AllIterator),
    Fixed(FixedIterator),
    Position(PositionIterator),
    LinksTo(LinksTo),
    And(And),
}

impl GraphIterator {
    /// Advance to the next result. `false` is terminal until [`reset`].
    ///
    /// [`reset`]: GraphIterator::reset
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool, StoreError> {
        match self {
            Self::All(it) => it.next(),
            Self::Fixed(it) => Ok(it.next()),
            Self::Position(it) => it.next(),
            Self::LinksTo(it) => it.next(),
            Self::And(it) => it.next(),
        }
    }

    /// The current result; `None` unless iterating.
    #[must_use]
    pub const fn result(&self) -> Option<Ref> {
        self.base().result()
    }

    /// Point membership test. A `true` answer makes `value` the current
    /// result for [`tag_results`](GraphIterator::tag_results).
    pub fn contains(&mut self, value: Ref) -> Result<bool, StoreError> {
        match self {
            Self::All(it) => it.contains(value),
            Self::Fixed(it) => Ok(it.contains(value)),
            Self::Position(it) => it.contains(value),
            Self::LinksTo(it) => it.contains(value),
            Self::And(it) => it.contains(value),
        }
    }

    pub fn size(&self) -> Result<SizeHint, StoreError> {
        match self {
            Self::All(it) => it.size(),
            Self::Fixed(it) => Ok(it.size()),
            Self::Position(it) => it.size(),
            Self::LinksTo(it) => it.size(),
            Self::And(it) => it.size(),
        }
    }

    /// Record the bindings for the current result, including those of
    /// sub-iterators on the path to it.
    pub fn tag_results(&self, dst: &mut TagMap) {
        match self {
            Self::All(it) => it.tag_results(dst),
            Self::Fixed(it) => it.tag_results(dst),
            Self::Position(it) => it.tag_results(dst),
            Self::LinksTo(it) => it.tag_results(dst),
            Self::And(it) => it.tag_results(dst),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::All(it) => it.reset(),
            Self::Fixed(it) => it.reset(),
            Self::Position(it) => it.reset(),
            Self::LinksTo(it) => it.reset(),
            Self::And(it) => it.reset(),
        }
    }

    /// Rewrite into an equivalent, cheaper tree.
    ///
    /// The result set and the tag bindings of every result are preserved;
    /// result order may change. The returned flag is `true` when anything
    /// was rewritten.
    #[must_use]
    pub fn optimize(self) -> (Self, bool) {
        match self {
            Self::LinksTo(it) => it.optimize(),
            Self::And(it) => it.optimize(),
            leaf @ (Self::All(_) | Self::Fixed(_) | Self::Position(_)) => (leaf, false),
        }
    }

    #[must_use]
    pub const fn iterator_type(&self) -> IteratorType {
        match self {
            Self::All(_) => IteratorType::All,
            Self::Fixed(_) => IteratorType::Fixed,
            Self::Position(_) => IteratorType::Position,
            Self::LinksTo(_) => IteratorType::LinksTo,
            Self::And(_) => IteratorType::And,
        }
    }

    #[must_use]
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::All(it) => Some(it.category()),
            Self::Fixed(it) => it.category(),
            Self::Position(_) | Self::LinksTo(_) => Some(Category::Quads),
            Self::And(it) => it.category(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.base().state()
    }

    #[must_use]
    pub const fn tagger(&self) -> &Tagger {
        &self.base().tagger
    }

    pub const fn tagger_mut(&mut self) -> &mut Tagger {
        match self {
            Self::All(it) => it.tagger_mut(),
            Self::Fixed(it) => it.tagger_mut(),
            Self::Position(it) => it.tagger_mut(),
            Self::LinksTo(it) => it.tagger_mut(),
            Self::And(it) => it.tagger_mut(),
        }
    }

    /// The engine this tree reads from; `None` for a tree of fixed sets.
    pub(crate) fn engine(&self) -> Option<&Arc<Engine>> {
        match self {
            Self::All(it) => Some(it.engine()),
            Self::Fixed(_) => None,
            Self::Position(it) => Some(it.engine()),
            Self::LinksTo(it) => Some(it.engine()),
            Self::And(it) => it.engine(),
        }
    }

    /// Make this tree read through `snapshot` until it is reset, or release
    /// the held snapshot when `None`.
    pub(crate) fn set_snapshot(&mut self, snapshot: Option<&Arc<Snapshot>>) {
        match self {
            Self::All(it) => it.set_snapshot(snapshot),
            Self::Fixed(_) => {}
            Self::Position(it) => it.set_snapshot(snapshot),
            Self::LinksTo(it) => it.set_snapshot(snapshot),
            Self::And(it) => it.set_snapshot(snapshot),
        }
    }

    const fn base(&self) -> &Base {
        match self {
            Self::All(it) => it.base(),
            Self::Fixed(it) => it.base(),
            Self::Position(it) => it.base(),
            Self::LinksTo(it) => it.base(),
            Self::And(it) => it.base(),
        }
    }
}

impl From<AllIterator> for GraphIterator {
    fn from(it: AllIterator) -> Self {
        Self::All(it)
    }
}

impl From<FixedIterator> for GraphIterator {
    fn from(it: FixedIterator) -> Self {
        Self::Fixed(it)
    }
}

impl From<PositionIterator> for GraphIterator {
    fn from(it: PositionIterator) -> Self {
        Self::Position(it)
    }
}

impl From<LinksTo> for GraphIterator {
    fn from(it: LinksTo) -> Self {
        Self::LinksTo(it)
    }
}

impl From<And> for GraphIterator {
    fn from(it: And) -> Self {
        Self::And(it)
    }
}
