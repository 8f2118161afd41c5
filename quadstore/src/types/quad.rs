//! Quads and quad positions.

use std::fmt;

use serde::Deserialize;

/// A position within a quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Subject,
    Predicate,
    Object,
    Label,
}

impl Direction {
    /// All positions in storage order.
    pub const ALL: [Self; 4] = [Self::Subject, Self::Predicate, Self::Object, Self::Label];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subject => "subject",
            Self::Predicate => "predicate",
            Self::Object => "object",
            Self::Label => "label",
        };
        f.write_str(name)
    }
}

/// A directed, labeled edge between two nodes.
///
/// An empty `label` places the quad in the default graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
pub struct Quad {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    #[serde(default)]
    pub label: String,
}

impl Quad {
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            label: label.into(),
        }
    }

    /// The value at the given position.
    #[must_use]
    pub fn get(&self, direction: Direction) -> &str {
        match direction {
            Direction::Subject => &self.subject,
            Direction::Predicate => &self.predicate,
            Direction::Object => &self.object,
            Direction::Label => &self.label,
        }
    }

    /// A quad is storable when subject, predicate and object are non-empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.subject.is_empty() && !self.predicate.is_empty() && !self.object.is_empty()
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{} -- {} -> {}", self.subject, self.predicate, self.object)
        } else {
            write!(
                f,
                "{} -- {} -> {} ({})",
                self.subject, self.predicate, self.object, self.label
            )
        }
    }
}
