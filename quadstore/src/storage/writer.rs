//! Sequenced quad writes.
//!
//! The writer applies adds and removes one quad at a time, each in its own
//! engine transaction, and assigns every processed quad the next horizon.
//! Callers must not drive two writers against one store concurrently; the
//! `&mut self` receivers make a single writer's calls sequential.

use crate::storage::store::{Change, ChangeKind, QuadStore, StoreError};
use crate::types::{Horizon, Quad};

/// How the writer treats no-op writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Adding a live quad is a soft [`AddOutcome::Duplicate`] when `true`,
    /// a [`WriterError::Duplicate`] when `false`.
    pub ignore_duplicate: bool,
    /// Removing an absent quad is a soft [`RemoveOutcome::Missing`] when
    /// `true`, a [`WriterError::Missing`] when `false`.
    pub ignore_missing: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            ignore_duplicate: true,
            ignore_missing: true,
        }
    }
}

/// Outcome of a successful add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(Horizon),
    /// The quad was already live. The horizon still advanced.
    Duplicate(Horizon),
}

impl AddOutcome {
    #[must_use]
    pub const fn horizon(self) -> Horizon {
        match self {
            Self::Added(h) | Self::Duplicate(h) => h,
        }
    }
}

/// Outcome of a successful remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(Horizon),
    /// The quad was not live. The horizon still advanced.
    Missing(Horizon),
}

impl RemoveOutcome {
    #[must_use]
    pub const fn horizon(self) -> Horizon {
        match self {
            Self::Removed(h) | Self::Missing(h) => h,
        }
    }
}

/// Applies quad writes to a [`QuadStore`].
pub struct Writer<'a> {
    store: &'a QuadStore,
    options: WriterOptions,
}

impl<'a> Writer<'a> {
    #[must_use]
    pub fn new(store: &'a QuadStore) -> Self {
        Self::with_options(store, WriterOptions::default())
    }

    #[must_use]
    pub const fn with_options(store: &'a QuadStore, options: WriterOptions) -> Self {
        Self { store, options }
    }

    #[must_use]
    pub const fn options(&self) -> WriterOptions {
        self.options
    }

    /// Add one quad.
    pub fn add_quad(&mut self, quad: &Quad) -> Result<AddOutcome, WriterError> {
        let change = self
            .store
            .apply(ChangeKind::Add, quad, self.options.ignore_duplicate)
            .map_err(|source| WriterError::Apply {
                quad: Box::new(quad.clone()),
                source,
            })?;

        match change {
            Change::Applied(horizon) => Ok(AddOutcome::Added(horizon)),
            Change::Noop(Some(horizon)) => {
                tracing::debug!("duplicate add of {quad} at horizon {horizon}");
                Ok(AddOutcome::Duplicate(horizon))
            }
            Change::Noop(None) => Err(WriterError::Duplicate(Box::new(quad.clone()))),
        }
    }

    /// Add quads in order, each committed on its own.
    ///
    /// Stops at the first failure. Quads before it stay applied and the
    /// error reports how many that was.
    pub fn add_quad_set(&mut self, quads: &[Quad]) -> Result<Vec<AddOutcome>, WriterError> {
        let mut outcomes = Vec::with_capacity(quads.len());
        for quad in quads {
            match self.add_quad(quad) {
                Ok(outcome) => outcomes.push(outcome),
                Err(source) => {
                    tracing::warn!(
                        "quad set stopped after {} of {} quads: {source}",
                        outcomes.len(),
                        quads.len()
                    );
                    return Err(WriterError::Batch {
                        applied: outcomes.len(),
                        source: Box::new(source),
                    });
                }
            }
        }
        Ok(outcomes)
    }

    /// Remove one quad.
    pub fn remove_quad(&mut self, quad: &Quad) -> Result<RemoveOutcome, WriterError> {
        let change = self
            .store
            .apply(ChangeKind::Remove, quad, self.options.ignore_missing)
            .map_err(|source| WriterError::Apply {
                quad: Box::new(quad.clone()),
                source,
            })?;

        match change {
            Change::Applied(horizon) => Ok(RemoveOutcome::Removed(horizon)),
            Change::Noop(Some(horizon)) => {
                tracing::debug!("remove of absent {quad} at horizon {horizon}");
                Ok(RemoveOutcome::Missing(horizon))
            }
            Change::Noop(None) => Err(WriterError::Missing(Box::new(quad.clone()))),
        }
    }
}

/// Errors that can occur while writing quads.
#[derive(Debug)]
pub enum WriterError {
    /// The store failed to apply a quad.
    Apply { quad: Box<Quad>, source: StoreError },
    /// The quad was already live and duplicates are not ignored.
    Duplicate(Box<Quad>),
    /// The quad was not live and missing removes are not ignored.
    Missing(Box<Quad>),
    /// A quad set stopped early; the first `applied` quads were committed.
    Batch {
        applied: usize,
        source: Box<WriterError>,
    },
}

impl WriterError {
    /// The store error underneath, if any.
    #[must_use]
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Apply { source, .. } => Some(source),
            Self::Batch { source, .. } => source.store_error(),
            Self::Duplicate(_) | Self::Missing(_) => None,
        }
    }
}

impl std::fmt::Display for WriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apply { quad, source } => write!(f, "failed to write {quad}: {source}"),
            Self::Duplicate(quad) => write!(f, "quad already exists: {quad}"),
            Self::Missing(quad) => write!(f, "quad does not exist: {quad}"),
            Self::Batch { applied, source } => {
                write!(f, "quad set failed after {applied} quads: {source}")
            }
        }
    }
}

impl std::error::Error for WriterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Apply { source, .. } => Some(source),
            Self::Batch { source, .. } => Some(source.as_ref()),
            Self::Duplicate(_) | Self::Missing(_) => None,
        }
    }
}
