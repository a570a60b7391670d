//! Transposition links between out-of-order vertices.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::vertex::VertexId;

/// Arena identifier of a transposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TranspositionId(u64);

impl TranspositionId {
    /// Create a transposition id from its raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw arena index.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TranspositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Unordered link between vertices holding the same content at positions
/// that are out of the graph's primary order.
///
/// Not part of ranking or traversal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transposition {
    /// Transposition id.
    pub id: TranspositionId,
    /// Linked vertices (at least two).
    pub vertices: BTreeSet<VertexId>,
}

impl Transposition {
    /// Create a new transposition.
    pub fn new(id: TranspositionId, vertices: BTreeSet<VertexId>) -> Self {
        Self { id, vertices }
    }

    /// Whether the given vertex takes part in this transposition.
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// The linked vertices other than `vertex`.
    pub fn others(&self, vertex: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().copied().filter(move |v| *v != vertex)
    }
}

impl fmt::Display for Transposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vertices: Vec<String> = self.vertices.iter().map(|v| v.to_string()).collect();
        write!(f, "{}{{{}}}", self.id, vertices.join(" ~ "))
    }
}
