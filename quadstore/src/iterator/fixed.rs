use crate::iterator::{Base, Category, SizeHint, TagMap, Tagger};
use crate::types::Ref;

/// A caller-supplied set of values, yielded in insertion order.
#[derive(Debug, Default)]
pub struct FixedIterator {
    base: Base,
    values: Vec<Ref>,
    index: usize,
}

impl FixedIterator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to the set. Adding a value twice has no effect.
    pub fn add(&mut self, value: impl Into<Ref>) {
        let value = value.into();
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }

    #[must_use]
    pub fn with(mut self, value: impl Into<Ref>) -> Self {
        self.add(value);
        self
    }

    #[must_use]
    pub fn values(&self) -> &[Ref] {
        &self.values
    }

    /// `Nodes` or `Quads` when every value is of that kind.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        let mut values = self.values.iter();
        let first = match values.next()? {
            Ref::Node(_) => Category::Nodes,
            Ref::Quad(_) => Category::Quads,
        };
        values
            .all(|value| Category::of(value) == first)
            .then_some(first)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.base.is_exhausted() {
            return false;
        }
        if let Some(value) = self.values.get(self.index) {
            self.index += 1;
            self.base.advance(*value);
            true
        } else {
            self.base.exhaust();
            false
        }
    }

    #[must_use]
    pub const fn result(&self) -> Option<Ref> {
        self.base.result()
    }

    pub fn contains(&mut self, value: Ref) -> bool {
        let found = self.values.contains(&value);
        if found {
            self.base.set_result(value);
        }
        found
    }

    #[must_use]
    pub fn size(&self) -> SizeHint {
        SizeHint::exact(self.values.len() as u64)
    }

    pub fn tag_results(&self, dst: &mut TagMap) {
        self.base.tag_results(dst);
    }

    pub fn reset(&mut self) {
        self.base.reset();
        self.index = 0;
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

impl Clone for FixedIterator {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            values: self.values.clone(),
            index: 0,
        }
    }
}
