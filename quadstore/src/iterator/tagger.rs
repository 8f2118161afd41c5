use std::collections::BTreeMap;

use crate::types::Ref;

/// Named bindings collected along the path to an iterator's result.
pub type TagMap = BTreeMap<String, Ref>;

/// The tags attached to one iterator.
///
/// Plain tags bind to whatever the iterator currently yields. Fixed tags
/// bind to a constant value regardless of the current result; the optimizer
/// produces them when it folds a single-value set into an index scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tagger {
    tags: Vec<String>,
    fixed: BTreeMap<String, Ref>,
}

impl Tagger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `tag` to the current result.
    pub fn add(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Bind `tag` to `value` for every result.
    pub fn add_fixed(&mut self, tag: impl Into<String>, value: Ref) {
        self.fixed.insert(tag.into(), value);
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub const fn fixed(&self) -> &BTreeMap<String, Ref> {
        &self.fixed
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.fixed.is_empty()
    }

    /// Merge every tag of `other` into this tagger.
    pub fn copy_from(&mut self, other: &Self) {
        for tag in &other.tags {
            self.add(tag.clone());
        }
        for (tag, value) in &other.fixed {
            self.fixed.insert(tag.clone(), *value);
        }
    }

    /// Record this tagger's bindings for `result` into `dst`.
    pub fn tag_result(&self, dst: &mut TagMap, result: Option<Ref>) {
        if let Some(result) = result {
            for tag in &self.tags {
                dst.insert(tag.clone(), result);
            }
        }
        for (tag, value) in &self.fixed {
            dst.insert(tag.clone(), *value);
        }
    }
}
