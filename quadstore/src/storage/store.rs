//! The quad store facade.
//!
//! Owns the engine handle and exposes interning lookups, size and horizon
//! accounting, quad materialization, and the iterator factories. All writes
//! go through [`Writer`](crate::storage::Writer), which calls
//! [`QuadStore::apply`] once per quad.

use std::path::Path;
use std::sync::Arc;

use redb::WriteTransaction;

use crate::config::StoreConfig;
use crate::iterator::{AllIterator, And, FixedIterator, GraphIterator, LinksTo, PositionIterator};
use crate::storage::engine::{Engine, EngineError, Snapshot, redb_error};
use crate::storage::indexes::{IndexOrder, IndexSet, PrimaryIndex};
use crate::storage::nodes;
use crate::storage::tables::{self, META, meta};
use crate::storage::values::ValueCodec;
use crate::types::{Direction, Horizon, NodeId, Quad, QuadKey, Ref};

/// A quad store backed by one engine file.
///
/// Every handle to the store (iterators included) shares the same engine;
/// after [`QuadStore::close`] all of them fail with [`StoreError::Closed`].
#[derive(Debug)]
pub struct QuadStore {
    engine: Arc<Engine>,
    page_size: usize,
}

/// Which mutation [`QuadStore::apply`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeKind {
    Add,
    Remove,
}

/// Result of [`QuadStore::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Change {
    /// The quad was added or removed at this horizon.
    Applied(Horizon),
    /// Nothing to do (already present / not present). Carries the horizon
    /// consumed, or `None` if the no-op was rolled back.
    Noop(Option<Horizon>),
}

impl QuadStore {
    /// Create a new store. The path must not already exist.
    pub fn create(path: &Path, config: &StoreConfig) -> Result<Self, StoreError> {
        let engine = Engine::create(path, config).map_err(StoreError::Open)?;
        tracing::info!("Created quad store at {}", path.display());
        Ok(Self::with_engine(engine, config))
    }

    /// Open an existing store.
    pub fn open(path: &Path, config: &StoreConfig) -> Result<Self, StoreError> {
        let engine = Engine::open(path, config).map_err(StoreError::Open)?;
        tracing::info!("Opened quad store at {}", path.display());
        Ok(Self::with_engine(engine, config))
    }

    /// Open an existing store or create a new one if it doesn't exist.
    pub fn open_or_create(path: &Path, config: &StoreConfig) -> Result<Self, StoreError> {
        if path.exists() {
            Self::open(path, config)
        } else {
            Self::create(path, config)
        }
    }

    fn with_engine(engine: Engine, config: &StoreConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            page_size: config.page_size.max(1),
        }
    }

    /// Release the engine. Later calls on this store or any of its
    /// iterators fail with [`StoreError::Closed`].
    pub fn close(&self) {
        if self.engine.close() {
            tracing::info!("Closed quad store at {}", self.engine.path().display());
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.engine.is_closed()
    }

    pub(crate) const fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.engine.path()
    }

    /// Number of live quads.
    pub fn size(&self) -> Result<u64, StoreError> {
        let snapshot = self.engine.begin_read()?;
        Ok(tables::counter(&snapshot.table(META)?, meta::SIZE)?)
    }

    /// Number of live quads referencing `id` in any position.
    pub fn size_of(&self, id: NodeId) -> Result<u64, StoreError> {
        let snapshot = self.engine.begin_read()?;
        Ok(nodes::size_of(&snapshot, id)?)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> Result<u64, StoreError> {
        let snapshot = self.engine.begin_read()?;
        Ok(nodes::live_count(&snapshot)?)
    }

    /// Number of add and remove operations processed so far.
    pub fn horizon(&self) -> Result<Horizon, StoreError> {
        let snapshot = self.engine.begin_read()?;
        Ok(Horizon(tables::counter(&snapshot.table(META)?, meta::HORIZON)?))
    }

    /// The id a value was interned as.
    ///
    /// The empty value is the default-graph label and maps to
    /// [`NodeId::NONE`].
    pub fn value_of(&self, value: &str) -> Result<NodeId, StoreError> {
        let snapshot = self.engine.begin_read()?;
        ValueCodec::id_of(&snapshot, value)?
            .ok_or_else(|| StoreError::NotFound(Lookup::Value(value.to_string())))
    }

    /// The value an id was interned from.
    pub fn name_of(&self, id: NodeId) -> Result<String, StoreError> {
        let snapshot = self.engine.begin_read()?;
        name_in(&snapshot, id)
    }

    /// Materialize a quad result.
    pub fn quad(&self, result: Ref) -> Result<Quad, StoreError> {
        let Ref::Quad(key) = result else {
            return Err(StoreError::NotFound(Lookup::NotAQuad(result)));
        };
        let snapshot = self.engine.begin_read()?;
        if !PrimaryIndex::contains(&snapshot, &key)? {
            return Err(StoreError::NotFound(Lookup::Quad(key)));
        }
        Ok(Quad {
            subject: name_in(&snapshot, key.subject)?,
            predicate: name_in(&snapshot, key.predicate)?,
            object: name_in(&snapshot, key.object)?,
            label: name_in(&snapshot, key.label)?,
        })
    }

    /// The horizon at which a live quad was added.
    pub fn quad_horizon(&self, key: &QuadKey) -> Result<Horizon, StoreError> {
        let snapshot = self.engine.begin_read()?;
        PrimaryIndex::horizon_of(&snapshot, key)?
            .ok_or(StoreError::NotFound(Lookup::Quad(*key)))
    }

    /// The storage key of a quad, if all of its values are interned.
    pub fn quad_key(&self, quad: &Quad) -> Result<Option<QuadKey>, StoreError> {
        let snapshot = self.engine.begin_read()?;
        let mut ids = [NodeId::NONE; 4];
        for (slot, direction) in ids.iter_mut().zip(Direction::ALL) {
            match ValueCodec::id_of(&snapshot, quad.get(direction))? {
                Some(id) => *slot = id,
                None => return Ok(None),
            }
        }
        Ok(Some(QuadKey::new(ids[0], ids[1], ids[2], ids[3])))
    }

    /// Returns `true` if `quad` is live.
    pub fn contains_quad(&self, quad: &Quad) -> Result<bool, StoreError> {
        let Some(key) = self.quad_key(quad)? else {
            return Ok(false);
        };
        let snapshot = self.engine.begin_read()?;
        Ok(PrimaryIndex::contains(&snapshot, &key)?)
    }

    /// Every live node.
    #[must_use]
    pub fn nodes_all_iterator(&self) -> AllIterator {
        AllIterator::nodes(Arc::clone(&self.engine), self.page_size)
    }

    /// Every live quad.
    #[must_use]
    pub fn quads_all_iterator(&self) -> AllIterator {
        AllIterator::quads(Arc::clone(&self.engine), self.page_size)
    }

    /// An empty fixed set; fill it with [`FixedIterator::add`].
    #[must_use]
    pub fn fixed_iterator(&self) -> FixedIterator {
        FixedIterator::new()
    }

    /// Quads whose value at `direction` is `id`.
    #[must_use]
    pub fn quad_iterator(&self, direction: Direction, id: NodeId) -> PositionIterator {
        PositionIterator::new(Arc::clone(&self.engine), self.page_size, direction, id)
    }

    /// Quads whose value at `direction` is a result of `primary`.
    #[must_use]
    pub fn links_to(&self, primary: impl Into<GraphIterator>, direction: Direction) -> LinksTo {
        LinksTo::new(
            Arc::clone(&self.engine),
            self.page_size,
            primary.into(),
            direction,
        )
    }

    /// An empty intersection; fill it with [`And::add`].
    #[must_use]
    pub fn and(&self) -> And {
        And::new()
    }

    /// Apply one add or remove in its own write transaction.
    ///
    /// When the change is a no-op, `tick_noop` decides whether it still
    /// consumes a horizon tick (and commits) or is rolled back.
    pub(crate) fn apply(
        &self,
        kind: ChangeKind,
        quad: &Quad,
        tick_noop: bool,
    ) -> Result<Change, StoreError> {
        if !quad.is_valid() {
            return Err(StoreError::InvalidQuad(Box::new(quad.clone())));
        }

        let txn = self.engine.begin_write()?;
        let horizon = {
            let counters = txn.open_table(META).map_err(redb_error("open meta"))?;
            Horizon(tables::counter(&counters, meta::HORIZON)?).next()
        };

        let applied = match kind {
            ChangeKind::Add => add_in(&txn, quad, horizon)?,
            ChangeKind::Remove => remove_in(&txn, quad)?,
        };

        if !applied && !tick_noop {
            txn.abort().map_err(redb_error("abort write"))?;
            return Ok(Change::Noop(None));
        }

        {
            let mut counters = txn.open_table(META).map_err(redb_error("open meta"))?;
            counters
                .insert(meta::HORIZON, horizon.get())
                .map_err(redb_error("advance horizon"))?;
        }
        txn.commit().map_err(redb_error("commit write"))?;

        Ok(if applied {
            Change::Applied(horizon)
        } else {
            Change::Noop(Some(horizon))
        })
    }
}

fn name_in(snapshot: &Snapshot, id: NodeId) -> Result<String, StoreError> {
    ValueCodec::value_of(snapshot, id)?.ok_or(StoreError::NotFound(Lookup::Id(id)))
}

fn add_in(txn: &WriteTransaction, quad: &Quad, horizon: Horizon) -> Result<bool, StoreError> {
    let key = QuadKey::new(
        ValueCodec::intern(txn, &quad.subject)?,
        ValueCodec::intern(txn, &quad.predicate)?,
        ValueCodec::intern(txn, &quad.object)?,
        ValueCodec::intern(txn, &quad.label)?,
    );

    if PrimaryIndex::open(txn)?.insert(&key, horizon)?.is_some() {
        return Ok(false);
    }

    let added = IndexSet::add(txn, &key)?;
    if added != IndexOrder::ALL.len() {
        return Err(StoreError::Corrupt(format!(
            "index entries for {key} existed before the quad was added"
        )));
    }
    nodes::retain(txn, &key)?;
    adjust_size(txn, 1)?;
    Ok(true)
}

fn remove_in(txn: &WriteTransaction, quad: &Quad) -> Result<bool, StoreError> {
    let mut ids = [NodeId::NONE; 4];
    for (slot, direction) in ids.iter_mut().zip(Direction::ALL) {
        match ValueCodec::id_in(txn, quad.get(direction))? {
            Some(id) => *slot = id,
            None => return Ok(false),
        }
    }
    let key = QuadKey::new(ids[0], ids[1], ids[2], ids[3]);

    if PrimaryIndex::open(txn)?.remove(&key)?.is_none() {
        return Ok(false);
    }

    let removed = IndexSet::remove(txn, &key)?;
    if removed != IndexOrder::ALL.len() {
        return Err(StoreError::Corrupt(format!(
            "only {removed} index entries found for live quad {key}"
        )));
    }
    nodes::release(txn, &key)?;
    adjust_size(txn, -1)?;
    Ok(true)
}

fn adjust_size(txn: &WriteTransaction, delta: i64) -> Result<(), EngineError> {
    let mut counters = txn.open_table(META).map_err(redb_error("open meta"))?;
    tables::adjust_counter(&mut counters, meta::SIZE, delta)?;
    Ok(())
}

/// What a failed lookup was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Value(String),
    Id(NodeId),
    Quad(QuadKey),
    /// A node result was passed where a quad was expected.
    NotAQuad(Ref),
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => write!(f, "value {value:?}"),
            Self::Id(id) => write!(f, "node id {id}"),
            Self::Quad(key) => write!(f, "quad {key}"),
            Self::NotAQuad(result) => write!(f, "quad for non-quad result {result}"),
        }
    }
}

/// Errors that can occur during quad store operations.
#[derive(Debug)]
pub enum StoreError {
    /// The store could not be opened or created.
    Open(EngineError),
    /// The store was closed.
    Closed,
    /// A lookup missed. Recoverable; the caller decides.
    NotFound(Lookup),
    /// Subject, predicate or object was empty.
    InvalidQuad(Box<Quad>),
    /// Persisted state violates a store invariant.
    Corrupt(String),
    /// The engine failed.
    Engine(EngineError),
}

impl StoreError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(e) => write!(f, "open error: {e}"),
            Self::Closed => write!(f, "quad store is closed"),
            Self::NotFound(lookup) => write!(f, "not found: {lookup}"),
            Self::InvalidQuad(quad) => write!(f, "invalid quad: {quad}"),
            Self::Corrupt(message) => write!(f, "corrupt store: {message}"),
            Self::Engine(e) => write!(f, "engine error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(e) | Self::Engine(e) => Some(e),
            Self::Closed | Self::NotFound(_) | Self::InvalidQuad(_) | Self::Corrupt(_) => None,
        }
    }
}

impl From<EngineError> for StoreError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Closed => Self::Closed,
            other => Self::Engine(other),
        }
    }
}
