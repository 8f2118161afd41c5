//! Binding to the ordered key-value engine.
//!
//! The quad store talks to redb only through this module: opening and
//! closing the file, beginning read snapshots and write transactions, and
//! bulk reads of duplicate-sorted tables.
//!
//! # Duplicate-sorted tables
//!
//! An index order stores each entry as the composite key `prefix || value`
//! with a unit value. All values sharing a prefix are therefore contiguous
//! and sorted, and [`Snapshot::get_multiple`] returns up to `limit` of them
//! as one fixed-stride [`Multi`] page from a single range read.

use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use redb::{
    Database, Durability, Key, ReadOnlyTable, ReadTransaction, ReadableTable, TableDefinition,
    TableHandle, Value, WriteTransaction,
};

use crate::config::StoreConfig;
use crate::storage::multi::{Multi, MultiError, Stride};
use crate::storage::tables;

/// An open engine file.
///
/// The handle is dropped by [`Engine::close`]; every later request fails
/// with [`EngineError::Closed`].
#[derive(Debug)]
pub struct Engine {
    db: RwLock<Option<Database>>,
    path: PathBuf,
    durable_commits: bool,
}

impl Engine {
    /// Create a new engine file. The path must not already exist.
    pub fn create(path: &Path, config: &StoreConfig) -> Result<Self, EngineError> {
        if path.exists() {
            return Err(EngineError::AlreadyExists(path.to_path_buf()));
        }
        let db = builder(config)
            .create(path)
            .map_err(|e| open_error(path, e))?;
        Self::init(db, path, config)
    }

    /// Open an existing engine file.
    pub fn open(path: &Path, config: &StoreConfig) -> Result<Self, EngineError> {
        if !path.is_file() {
            return Err(EngineError::Open {
                path: path.to_path_buf(),
                message: "no database file at this path".to_string(),
            });
        }
        let db = builder(config).open(path).map_err(|e| open_error(path, e))?;
        Self::init(db, path, config)
    }

    /// Open the engine file if it exists, otherwise create it.
    pub fn open_or_create(path: &Path, config: &StoreConfig) -> Result<Self, EngineError> {
        if path.exists() {
            Self::open(path, config)
        } else {
            Self::create(path, config)
        }
    }

    fn init(db: Database, path: &Path, config: &StoreConfig) -> Result<Self, EngineError> {
        let txn = db.begin_write().map_err(|e| open_error(path, e))?;
        tables::create_all(&txn)?;
        txn.commit().map_err(|e| open_error(path, e))?;

        Ok(Self {
            db: RwLock::new(Some(db)),
            path: path.to_path_buf(),
            durable_commits: config.durable_commits,
        })
    }

    /// Path of the engine file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the engine handle. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        let mut guard = self.db.write().unwrap_or_else(PoisonError::into_inner);
        guard.take().is_some()
    }

    /// Returns `true` once [`Engine::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.db
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Begin a read snapshot.
    pub fn begin_read(&self) -> Result<Snapshot, EngineError> {
        let guard = self.db.read().unwrap_or_else(PoisonError::into_inner);
        let db = guard.as_ref().ok_or(EngineError::Closed)?;
        let txn = db.begin_read().map_err(redb_error("begin read"))?;
        Ok(Snapshot { txn })
    }

    /// Begin a write transaction.
    ///
    /// redb serializes writers; a second caller blocks until the first
    /// transaction commits or aborts.
    pub fn begin_write(&self) -> Result<WriteTransaction, EngineError> {
        let guard = self.db.read().unwrap_or_else(PoisonError::into_inner);
        let db = guard.as_ref().ok_or(EngineError::Closed)?;
        let mut txn = db.begin_write().map_err(redb_error("begin write"))?;
        if !self.durable_commits {
            txn.set_durability(Durability::Eventual);
        }
        Ok(txn)
    }
}

fn builder(config: &StoreConfig) -> redb::Builder {
    let mut builder = Database::builder();
    if let Some(cache_size) = config.cache_size {
        builder.set_cache_size(cache_size);
    }
    builder
}

fn open_error(path: &Path, e: impl Into<redb::Error>) -> EngineError {
    EngineError::Open {
        path: path.to_path_buf(),
        message: e.into().to_string(),
    }
}

/// A consistent read view of the engine.
///
/// Writers committing after the snapshot began are invisible to it.
/// Dropping the snapshot releases the read transaction.
pub struct Snapshot {
    txn: ReadTransaction,
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot").finish_non_exhaustive()
    }
}

impl Snapshot {
    /// Open a table for reading.
    pub fn table<K: Key + 'static, V: Value + 'static>(
        &self,
        def: TableDefinition<'_, K, V>,
    ) -> Result<ReadOnlyTable<K, V>, EngineError> {
        self.txn.open_table(def).map_err(redb_error("open table"))
    }

    /// Bulk-read the duplicates stored under `prefix`.
    ///
    /// Returns at most `limit` values of width `stride`, in ascending order,
    /// starting strictly after `after` when given. An empty page means the
    /// duplicates are exhausted.
    pub fn get_multiple<V: Value + 'static>(
        &self,
        def: TableDefinition<'_, &'static [u8], V>,
        prefix: &[u8],
        after: Option<&[u8]>,
        stride: Stride,
        limit: usize,
    ) -> Result<Multi<'static>, EngineError> {
        let table = self.table(def)?;

        let start_key: Vec<u8>;
        let lower = match after {
            Some(value) => {
                start_key = [prefix, value].concat();
                Bound::Excluded(start_key.as_slice())
            }
            None if prefix.is_empty() => Bound::Unbounded,
            None => Bound::Included(prefix),
        };
        let end_key = prefix_end(prefix);
        let upper = end_key
            .as_deref()
            .map_or(Bound::Unbounded, Bound::Excluded);

        let mut page = Multi::empty(stride)?;
        let range = table
            .range::<&[u8]>((lower, upper))
            .map_err(redb_error("get multiple"))?;
        for entry in range.take(limit) {
            let (key, _) = entry.map_err(redb_error("get multiple"))?;
            let key = key.value();
            page = page.append(&key[prefix.len()..])?;
        }

        tracing::trace!(
            table = def.name(),
            values = page.len(),
            "fetched duplicate page"
        );
        Ok(page)
    }
}

/// The smallest key greater than every key starting with `prefix`.
///
/// `None` when no such key exists (empty or all-`0xFF` prefix).
#[must_use]
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Adapter for `map_err` that tags a redb failure with the operation.
pub fn redb_error<E: Into<redb::Error>>(operation: &'static str) -> impl FnOnce(E) -> EngineError {
    move |e| EngineError::Redb {
        operation,
        source: Box::new(e.into()),
    }
}

/// Errors raised by the engine binding.
#[derive(Debug)]
pub enum EngineError {
    /// The file could not be opened or created.
    Open { path: PathBuf, message: String },
    /// `create` was asked for a path that already exists.
    AlreadyExists(PathBuf),
    /// The engine was closed.
    Closed,
    /// A stored value does not fit its table's stride.
    Stride(MultiError),
    /// An engine operation failed.
    Redb {
        operation: &'static str,
        source: Box<redb::Error>,
    },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, message } => {
                write!(f, "failed to open {}: {message}", path.display())
            }
            Self::AlreadyExists(path) => write!(f, "file already exists: {}", path.display()),
            Self::Closed => write!(f, "store is closed"),
            Self::Stride(e) => write!(f, "corrupt index page: {e}"),
            Self::Redb { operation, source } => write!(f, "{operation} failed: {source}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Stride(e) => Some(e),
            Self::Redb { source, .. } => Some(source.as_ref()),
            Self::Open { .. } | Self::AlreadyExists(_) | Self::Closed => None,
        }
    }
}

impl From<MultiError> for EngineError {
    fn from(e: MultiError) -> Self {
        Self::Stride(e)
    }
}
