use std::fmt;

use redb::TableDefinition;

use crate::storage::tables;
use crate::types::{Direction, NODE_ID_LEN, QuadKey};

/// A position order: which part of a quad an index table is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexOrder {
    Subject,
    Predicate,
    Object,
    Label,
    /// Keyed by subject then predicate.
    SubjectPredicate,
}

impl IndexOrder {
    pub const ALL: [Self; 5] = [
        Self::Subject,
        Self::Predicate,
        Self::Object,
        Self::Label,
        Self::SubjectPredicate,
    ];

    /// The single-position order for `direction`.
    #[must_use]
    pub const fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Subject => Self::Subject,
            Direction::Predicate => Self::Predicate,
            Direction::Object => Self::Object,
            Direction::Label => Self::Label,
        }
    }

    /// One-byte tag namespacing this order's entries in `index_counts`.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Subject => b's',
            Self::Predicate => b'p',
            Self::Object => b'o',
            Self::Label => b'c',
            Self::SubjectPredicate => b'S',
        }
    }

    #[must_use]
    pub const fn table(self) -> TableDefinition<'static, &'static [u8], ()> {
        match self {
            Self::Subject => tables::IDX_SUBJECT,
            Self::Predicate => tables::IDX_PREDICATE,
            Self::Object => tables::IDX_OBJECT,
            Self::Label => tables::IDX_LABEL,
            Self::SubjectPredicate => tables::IDX_SUBJECT_PREDICATE,
        }
    }

    /// Width of this order's key prefix in bytes.
    #[must_use]
    pub const fn prefix_len(self) -> usize {
        match self {
            Self::SubjectPredicate => NODE_ID_LEN * 2,
            _ => NODE_ID_LEN,
        }
    }

    /// The key prefix `key` is filed under.
    #[must_use]
    pub fn prefix(self, key: &QuadKey) -> Vec<u8> {
        match self {
            Self::Subject => key.subject.to_bytes().to_vec(),
            Self::Predicate => key.predicate.to_bytes().to_vec(),
            Self::Object => key.object.to_bytes().to_vec(),
            Self::Label => key.label.to_bytes().to_vec(),
            Self::SubjectPredicate => {
                [key.subject.to_bytes(), key.predicate.to_bytes()].concat()
            }
        }
    }

    /// The full composite entry stored for `key`.
    #[must_use]
    pub fn entry(self, key: &QuadKey) -> Vec<u8> {
        let mut entry = self.prefix(key);
        entry.extend_from_slice(&key.to_bytes());
        entry
    }

    /// The `index_counts` key for `prefix` in this order.
    #[must_use]
    pub fn count_key(self, prefix: &[u8]) -> Vec<u8> {
        let mut count_key = Vec::with_capacity(1 + prefix.len());
        count_key.push(self.tag());
        count_key.extend_from_slice(prefix);
        count_key
    }
}

impl fmt::Display for IndexOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subject => "subject",
            Self::Predicate => "predicate",
            Self::Object => "object",
            Self::Label => "label",
            Self::SubjectPredicate => "subject_predicate",
        };
        f.write_str(name)
    }
}
