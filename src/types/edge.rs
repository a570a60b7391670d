//! Edge types for the variant graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::token::Sigil;
use super::vertex::VertexId;

/// Arena identifier of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(u64);

impl EdgeId {
    /// Create an edge id from its raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw arena index.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Edge in the variant graph.
///
/// Represents a directed transition from one aligned position to the next,
/// labeled with the witnesses that read the two positions consecutively.
/// Implements `Ord` for deterministic ordering: (from, to, id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Edge id.
    pub id: EdgeId,
    /// Source vertex.
    pub from: VertexId,
    /// Target vertex.
    pub to: VertexId,
    /// Witnesses traversing this edge.
    pub witnesses: BTreeSet<Sigil>,
}

impl Edge {
    /// Create a new edge.
    pub fn new(id: EdgeId, from: VertexId, to: VertexId, witnesses: BTreeSet<Sigil>) -> Self {
        Self { id, from, to, witnesses }
    }

    /// Whether any of the given witnesses traverses this edge.
    ///
    /// `None` or an empty filter means "all witnesses", so every edge,
    /// including the empty placeholder, is traversable.
    pub fn traversable_with(&self, filter: Option<&BTreeSet<Sigil>>) -> bool {
        match filter {
            None => true,
            Some(f) if f.is_empty() => true,
            Some(f) => !self.witnesses.is_disjoint(f),
        }
    }
}

// Canonical ordering: from, then to, then id
impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.from
            .cmp(&other.from)
            .then_with(|| self.to.cmp(&other.to))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sigils: Vec<&str> = self.witnesses.iter().map(Sigil::as_str).collect();
        write!(f, "{} -> {} [{}]", self.from, self.to, sigils.join(", "))
    }
}
