//! Internal identifier types.
//!
//! Node values are interned to fixed-width [`NodeId`]s. A quad's storage
//! identity is the tuple of its four node ids ([`QuadKey`]). Iterators yield
//! [`Ref`]s, which name either a node or a quad.

use std::fmt;

use crate::types::Direction;

/// Width of an encoded [`NodeId`] in bytes.
pub const NODE_ID_LEN: usize = 8;

/// Width of an encoded [`QuadKey`] in bytes.
pub const QUAD_KEY_LEN: usize = NODE_ID_LEN * 4;

/// An interned node identifier.
///
/// Ids are assigned sequentially starting at 1 and are never reused.
///
/// # Invariants
///
/// - Encoded form is big-endian, so byte order equals numeric order.
/// - `NodeId::NONE` (0) is reserved for the empty label and is never interned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeId(pub u64);

impl NodeId {
    /// The empty label (default graph).
    pub const NONE: Self = Self(0);

    /// Returns `true` for the reserved empty-label id.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Order-preserving byte encoding.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; NODE_ID_LEN] {
        self.0.to_be_bytes()
    }

    /// Decode from exactly [`NODE_ID_LEN`] bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let array: [u8; NODE_ID_LEN] = bytes.try_into().ok()?;
        Some(Self(u64::from_be_bytes(array)))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The storage identity of a quad: its four node ids in
/// subject, predicate, object, label order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuadKey {
    pub subject: NodeId,
    pub predicate: NodeId,
    pub object: NodeId,
    pub label: NodeId,
}

impl QuadKey {
    #[must_use]
    pub const fn new(subject: NodeId, predicate: NodeId, object: NodeId, label: NodeId) -> Self {
        Self {
            subject,
            predicate,
            object,
            label,
        }
    }

    /// The node id at the given position.
    #[must_use]
    pub const fn get(&self, direction: Direction) -> NodeId {
        match direction {
            Direction::Subject => self.subject,
            Direction::Predicate => self.predicate,
            Direction::Object => self.object,
            Direction::Label => self.label,
        }
    }

    /// All four ids in subject, predicate, object, label order.
    #[must_use]
    pub const fn ids(&self) -> [NodeId; 4] {
        [self.subject, self.predicate, self.object, self.label]
    }

    /// Fixed-width encoding, sorting subject first.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; QUAD_KEY_LEN] {
        let mut bytes = [0u8; QUAD_KEY_LEN];
        for (chunk, id) in bytes.chunks_exact_mut(NODE_ID_LEN).zip(self.ids()) {
            chunk.copy_from_slice(&id.to_bytes());
        }
        bytes
    }

    /// Decode from exactly [`QUAD_KEY_LEN`] bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != QUAD_KEY_LEN {
            return None;
        }
        let mut ids = bytes.chunks_exact(NODE_ID_LEN).filter_map(NodeId::from_bytes);
        Some(Self {
            subject: ids.next()?,
            predicate: ids.next()?,
            object: ids.next()?,
            label: ids.next()?,
        })
    }
}

impl fmt::Display for QuadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({} {} {} {})",
            self.subject, self.predicate, self.object, self.label
        )
    }
}

/// A value produced by an iterator: either a node or a quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ref {
    Node(NodeId),
    Quad(QuadKey),
}

impl Ref {
    #[must_use]
    pub const fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            Self::Quad(_) => None,
        }
    }

    #[must_use]
    pub const fn as_quad(&self) -> Option<QuadKey> {
        match self {
            Self::Quad(key) => Some(*key),
            Self::Node(_) => None,
        }
    }
}

impl From<NodeId> for Ref {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<QuadKey> for Ref {
    fn from(key: QuadKey) -> Self {
        Self::Quad(key)
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => write!(f, "{id}"),
            Self::Quad(key) => write!(f, "{key}"),
        }
    }
}

/// Logical write-log position.
///
/// Advances by exactly one for every add or remove the writer processes
/// and never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Horizon(pub u64);

impl Horizon {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
