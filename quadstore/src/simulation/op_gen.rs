//! Operation generator for deterministic simulation testing.
//!
//! Draws values from a small pool so that adds collide with live quads and
//! removes hit existing ones often enough to exercise both paths.

// Simulation code legitimately needs cloning for test data
#![allow(clippy::disallowed_methods)]

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::Quad;

/// Configuration for operation generation.
#[derive(Debug, Clone)]
pub struct OpGenConfig {
    /// Probability of a remove rather than an add.
    pub remove_rate: f64,
    /// Probability that a remove targets a live quad.
    pub hit_rate: f64,
    /// Probability of an invalid quad (empty predicate or object).
    pub invalid_rate: f64,
    /// Probability that a quad carries a non-default label.
    pub label_rate: f64,
    /// Number of distinct node values.
    pub value_pool_size: usize,
}

impl Default for OpGenConfig {
    fn default() -> Self {
        Self {
            remove_rate: 0.35,
            hit_rate: 0.7,
            invalid_rate: 0.02,
            label_rate: 0.25,
            value_pool_size: 8,
        }
    }
}

/// One generated writer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Add(Quad),
    Remove(Quad),
}

impl Op {
    #[must_use]
    pub const fn quad(&self) -> &Quad {
        match self {
            Self::Add(quad) | Self::Remove(quad) => quad,
        }
    }
}

/// Generator for random but reproducible operations.
pub struct OpGenerator {
    rng: StdRng,
    config: OpGenConfig,
    values: Vec<String>,
    predicates: Vec<String>,
    labels: Vec<String>,
}

impl OpGenerator {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, OpGenConfig::default())
    }

    #[must_use]
    pub fn with_config(seed: u64, config: OpGenConfig) -> Self {
        let values = (0..config.value_pool_size.max(1))
            .map(|i| format!("n{i}"))
            .collect();
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
            values,
            predicates: vec!["follows".to_string(), "likes".to_string()],
            labels: vec!["g1".to_string(), "g2".to_string()],
        }
    }

    /// Every value the generator can emit, including the default label.
    #[must_use]
    pub fn universe(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .values
            .iter()
            .chain(&self.predicates)
            .chain(&self.labels)
            .cloned()
            .collect();
        all.push(String::new());
        all
    }

    /// The next operation. Removes pick from `live` when they hit.
    pub fn next_op(&mut self, live: &BTreeSet<Quad>) -> Op {
        if self.rng.random_bool(self.config.remove_rate) {
            if !live.is_empty() && self.rng.random_bool(self.config.hit_rate) {
                let index = self.rng.random_range(0..live.len());
                if let Some(quad) = live.iter().nth(index) {
                    return Op::Remove(quad.clone());
                }
            }
            return Op::Remove(self.quad());
        }
        Op::Add(self.quad())
    }

    fn quad(&mut self) -> Quad {
        let mut quad = Quad::new(
            self.pick_value(),
            pick(&mut self.rng, &self.predicates),
            self.pick_value(),
            "",
        );
        if self.rng.random_bool(self.config.label_rate) {
            quad.label = pick(&mut self.rng, &self.labels);
        }
        if self.rng.random_bool(self.config.invalid_rate) {
            if self.rng.random_bool(0.5) {
                quad.predicate.clear();
            } else {
                quad.object.clear();
            }
        }
        quad
    }

    fn pick_value(&mut self) -> String {
        pick(&mut self.rng, &self.values)
    }
}

fn pick(rng: &mut StdRng, pool: &[String]) -> String {
    pool[rng.random_range(0..pool.len())].clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_is_deterministic() {
        let live = BTreeSet::new();
        let mut a = OpGenerator::new(7);
        let mut b = OpGenerator::new(7);
        for _ in 0..50 {
            assert_eq!(a.next_op(&live), b.next_op(&live));
        }
    }

    #[test]
    fn test_removes_hit_live_quads() {
        let config = OpGenConfig {
            remove_rate: 1.0,
            hit_rate: 1.0,
            ..OpGenConfig::default()
        };
        let mut generator = OpGenerator::with_config(3, config);
        let live: BTreeSet<Quad> = [Quad::new("n0", "follows", "n1", "")].into();
        for _ in 0..10 {
            assert_eq!(
                generator.next_op(&live),
                Op::Remove(Quad::new("n0", "follows", "n1", ""))
            );
        }
    }

    #[test]
    fn test_universe_covers_generated_values() {
        let mut generator = OpGenerator::new(11);
        let universe = generator.universe();
        let live = BTreeSet::new();
        for _ in 0..100 {
            let op = generator.next_op(&live);
            let quad = op.quad();
            for value in [&quad.subject, &quad.predicate, &quad.object, &quad.label] {
                assert!(universe.contains(value), "{value:?} not in universe");
            }
        }
    }
}
