//! Invariant checking for deterministic simulation testing.
//!
//! This module keeps a model of the quads that should be live and verifies
//! the store against it after each operation.

// Simulation code legitimately needs cloning for test data
#![allow(clippy::disallowed_methods)]

use std::collections::{BTreeMap, BTreeSet};

use crate::iterator::GraphIterator;
use crate::storage::{QuadStore, StoreError};
use crate::types::{Direction, Horizon, NodeId, Quad, Ref};

/// The expected state of the store.
#[derive(Debug, Default)]
pub struct Model {
    quads: BTreeSet<Quad>,
    horizon: u64,
}

impl Model {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed add. Returns `true` if the quad was not live.
    pub fn add(&mut self, quad: &Quad) -> bool {
        self.horizon += 1;
        self.quads.insert(quad.clone())
    }

    /// Record a processed remove. Returns `true` if the quad was live.
    pub fn remove(&mut self, quad: &Quad) -> bool {
        self.horizon += 1;
        self.quads.remove(quad)
    }

    #[must_use]
    pub const fn quads(&self) -> &BTreeSet<Quad> {
        &self.quads
    }

    #[must_use]
    pub const fn horizon(&self) -> Horizon {
        Horizon(self.horizon)
    }

    /// Number of live quads referencing each value. The default label is
    /// not a node and never counted.
    #[must_use]
    pub fn node_sizes(&self) -> BTreeMap<&str, u64> {
        let mut sizes = BTreeMap::new();
        for quad in &self.quads {
            let mut values: Vec<&str> = Direction::ALL
                .iter()
                .map(|d| quad.get(*d))
                .filter(|v| !v.is_empty())
                .collect();
            values.sort_unstable();
            values.dedup();
            for value in values {
                *sizes.entry(value).or_insert(0) += 1;
            }
        }
        sizes
    }

    /// Live quads whose value at `direction` is `value`.
    #[must_use]
    pub fn at(&self, direction: Direction, value: &str) -> Vec<Quad> {
        self.quads
            .iter()
            .filter(|quad| quad.get(direction) == value)
            .cloned()
            .collect()
    }
}

/// An invariant violation detected during simulation.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violation.
    pub description: String,
    /// Operation index where it was detected.
    pub operation_index: usize,
}

/// Checker for store invariants.
#[derive(Debug, Default)]
pub struct InvariantChecker {
    violations: Vec<InvariantViolation>,
}

impl InvariantChecker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    pub fn add_violation(&mut self, description: String, operation_index: usize) {
        tracing::warn!("invariant violated at op {operation_index}: {description}");
        self.violations.push(InvariantViolation {
            description,
            operation_index,
        });
    }

    /// Compare the cheap counters: horizon, size and live node count.
    pub fn check_counters(&mut self, store: &QuadStore, model: &Model, operation_index: usize) {
        if let Err(e) = self.try_check_counters(store, model, operation_index) {
            self.add_violation(
                format!("store error while checking counters: {e}"),
                operation_index,
            );
        }
    }

    /// Compare every per-value read and scan against the model.
    pub fn check_contents(
        &mut self,
        store: &QuadStore,
        model: &Model,
        universe: &[String],
        operation_index: usize,
    ) {
        if let Err(e) = self.try_check_contents(store, model, universe, operation_index) {
            self.add_violation(
                format!("store error while checking contents: {e}"),
                operation_index,
            );
        }
    }

    fn try_check_counters(
        &mut self,
        store: &QuadStore,
        model: &Model,
        operation_index: usize,
    ) -> Result<(), StoreError> {
        let horizon = store.horizon()?;
        if horizon != model.horizon() {
            self.add_violation(
                format!("horizon is {horizon}, expected {}", model.horizon()),
                operation_index,
            );
        }

        let size = store.size()?;
        if size != model.quads().len() as u64 {
            self.add_violation(
                format!("size is {size}, expected {}", model.quads().len()),
                operation_index,
            );
        }

        let nodes = store.node_count()?;
        let expected_nodes = model.node_sizes().len() as u64;
        if nodes != expected_nodes {
            self.add_violation(
                format!("node count is {nodes}, expected {expected_nodes}"),
                operation_index,
            );
        }
        Ok(())
    }

    fn try_check_contents(
        &mut self,
        store: &QuadStore,
        model: &Model,
        universe: &[String],
        operation_index: usize,
    ) -> Result<(), StoreError> {
        let mut all: GraphIterator = store.quads_all_iterator().into();
        let scanned = drain(store, &mut all)?;
        let expected: Vec<Quad> = model.quads().iter().cloned().collect();
        if scanned != expected {
            self.add_violation(
                format!("all-quads scan yielded {scanned:?}, expected {expected:?}"),
                operation_index,
            );
        }

        let sizes = model.node_sizes();
        for value in universe {
            let id = match store.value_of(value) {
                Ok(id) => id,
                Err(e) if e.is_not_found() => {
                    if sizes.contains_key(value.as_str()) {
                        self.add_violation(
                            format!("live value {value:?} has no id"),
                            operation_index,
                        );
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            if !value.is_empty() {
                let size = store.size_of(id)?;
                let expected = sizes.get(value.as_str()).copied().unwrap_or(0);
                if size != expected {
                    self.add_violation(
                        format!("size_of({value}) is {size}, expected {expected}"),
                        operation_index,
                    );
                }
            }

            for direction in Direction::ALL {
                let mut scan: GraphIterator = store.quad_iterator(direction, id).into();
                let scanned = drain(store, &mut scan)?;
                let expected = model.at(direction, value);
                if scanned != expected {
                    self.add_violation(
                        format!(
                            "{direction} scan of {value:?} yielded {scanned:?}, \
                             expected {expected:?}"
                        ),
                        operation_index,
                    );
                }
            }

            if !value.is_empty() {
                self.check_optimized(store, value, id, operation_index)?;
            }
        }

        for quad in model.quads() {
            if !store.contains_quad(quad)? {
                self.add_violation(format!("live quad {quad} not contained"), operation_index);
            }
        }
        Ok(())
    }

    /// Optimizing a tree must not change what it yields, including over
    /// values whose last quad is gone.
    fn check_optimized(
        &mut self,
        store: &QuadStore,
        value: &str,
        id: NodeId,
        operation_index: usize,
    ) -> Result<(), StoreError> {
        let trees: [GraphIterator; 2] = [
            store
                .and()
                .with(store.nodes_all_iterator())
                .with(store.fixed_iterator().with(id))
                .into(),
            store
                .and()
                .with(store.quads_all_iterator())
                .with(store.links_to(store.fixed_iterator().with(id), Direction::Object))
                .with(store.quad_iterator(Direction::Subject, id))
                .into(),
        ];
        for tree in trees {
            let before = drain_refs(&mut tree.clone())?;
            let (mut optimized, _) = tree.optimize();
            let after = drain_refs(&mut optimized)?;
            if after != before {
                self.add_violation(
                    format!("optimized tree over {value:?} yielded {after:?}, expected {before:?}"),
                    operation_index,
                );
            }
        }
        Ok(())
    }
}

fn drain_refs(it: &mut GraphIterator) -> Result<Vec<Ref>, StoreError> {
    let mut refs = Vec::new();
    while it.next()? {
        refs.extend(it.result());
    }
    refs.sort();
    Ok(refs)
}

fn drain(store: &QuadStore, it: &mut GraphIterator) -> Result<Vec<Quad>, StoreError> {
    let mut quads = Vec::new();
    while it.next()? {
        if let Some(result) = it.result() {
            quads.push(store.quad(result)?);
        }
    }
    quads.sort();
    Ok(quads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Writer;
    use crate::testing::TestStore;

    #[test]
    fn test_model_node_sizes_count_distinct_values() {
        let mut model = Model::new();
        model.add(&Quad::new("a", "knows", "a", ""));
        model.add(&Quad::new("a", "knows", "b", "g"));
        let sizes = model.node_sizes();
        assert_eq!(sizes.get("a"), Some(&2));
        assert_eq!(sizes.get("knows"), Some(&2));
        assert_eq!(sizes.get("b"), Some(&1));
        assert_eq!(sizes.get("g"), Some(&1));
        assert_eq!(sizes.get(""), None);
    }

    #[test]
    fn test_contents_hold_after_last_quad_removed() {
        let store = TestStore::new();
        let mut model = Model::new();
        let mut writer = Writer::new(&store);
        let quads = [
            Quad::new("a", "knows", "b", ""),
            Quad::new("b", "knows", "a", "g"),
        ];
        for quad in &quads {
            writer.add_quad(quad).unwrap();
            model.add(quad);
        }
        writer.remove_quad(&quads[1]).unwrap();
        model.remove(&quads[1]);

        let universe: Vec<String> = ["a", "b", "g", "knows"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        let mut checker = InvariantChecker::new();
        checker.check_counters(&store, &model, 0);
        checker.check_contents(&store, &model, &universe, 0);
        assert!(checker.violations().is_empty(), "{:?}", checker.violations());
    }

    #[test]
    fn test_model_ticks_on_every_op() {
        let mut model = Model::new();
        let quad = Quad::new("a", "knows", "b", "");
        assert!(model.add(&quad));
        assert!(!model.add(&quad));
        assert!(model.remove(&quad));
        assert!(!model.remove(&quad));
        assert_eq!(model.horizon(), Horizon(4));
    }
}
