//! In-memory variant graph store.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::VariantGraphStore;
use crate::types::{
    Edge, EdgeId, Sigil, Token, Transposition, TranspositionId, Vertex, VertexId,
};

/// Error type for in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InMemoryError {
    /// Vertex not found.
    #[error("Vertex not found: {0}")]
    VertexNotFound(VertexId),

    /// Edge not found.
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// Transposition not found.
    #[error("Transposition not found: {0}")]
    TranspositionNotFound(TranspositionId),

    /// An edge already exists for the ordered pair.
    #[error("Edge {from} -> {to} already exists")]
    DuplicateEdge {
        /// Source vertex.
        from: VertexId,
        /// Target vertex.
        to: VertexId,
    },

    /// Vertex still has edges or transpositions attached.
    #[error("Vertex {0} is still connected")]
    VertexInUse(VertexId),

    /// The store keeps no undo information.
    #[error("In-memory store cannot roll back")]
    RollbackUnsupported,

    /// A snapshot is internally inconsistent.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Next ids to hand out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    /// Next vertex id.
    pub next_vertex: u64,
    /// Next edge id.
    pub next_edge: u64,
    /// Next transposition id.
    pub next_transposition: u64,
}

/// Serializable image of a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// All vertices, ascending id.
    pub vertices: Vec<Vertex>,
    /// All edges, ascending id.
    pub edges: Vec<Edge>,
    /// All transpositions, ascending id.
    pub transpositions: Vec<Transposition>,
    /// Id allocation state.
    pub counters: IdCounters,
}

/// In-memory variant graph store.
///
/// Uses BTreeMap/BTreeSet for deterministic iteration order. Keeps
/// adjacency, ordered-pair and vertex→transposition indexes alongside the
/// arenas. Not transactional: `begin` and `commit` are no-ops and
/// `rollback` fails.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphStore {
    vertices: BTreeMap<VertexId, Vertex>,
    edges: BTreeMap<EdgeId, Edge>,
    transpositions: BTreeMap<TranspositionId, Transposition>,
    outgoing: BTreeMap<VertexId, BTreeSet<EdgeId>>,
    incoming: BTreeMap<VertexId, BTreeSet<EdgeId>>,
    pairs: BTreeMap<(VertexId, VertexId), EdgeId>,
    memberships: BTreeMap<VertexId, BTreeSet<TranspositionId>>,
    counters: IdCounters,
}

impl InMemoryGraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the whole store.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            vertices: self.vertices.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
            transpositions: self.transpositions.values().cloned().collect(),
            counters: self.counters,
        }
    }

    /// Rebuild a store, including its indexes, from a snapshot.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, InMemoryError> {
        let mut store = Self::new();
        for vertex in snapshot.vertices {
            if vertex.id().as_u64() >= snapshot.counters.next_vertex {
                return Err(InMemoryError::InvalidSnapshot(format!(
                    "vertex {} beyond id counter",
                    vertex.id()
                )));
            }
            store.insert_vertex(vertex);
        }
        for edge in snapshot.edges {
            if edge.id.as_u64() >= snapshot.counters.next_edge {
                return Err(InMemoryError::InvalidSnapshot(format!(
                    "edge {} beyond id counter",
                    edge.id
                )));
            }
            store.insert_edge(edge)?;
        }
        for transposition in snapshot.transpositions {
            if transposition.id.as_u64() >= snapshot.counters.next_transposition {
                return Err(InMemoryError::InvalidSnapshot(format!(
                    "transposition {} beyond id counter",
                    transposition.id
                )));
            }
            store.insert_transposition(transposition)?;
        }
        store.counters = snapshot.counters;
        Ok(store)
    }

    pub(crate) fn counters(&self) -> IdCounters {
        self.counters
    }

    pub(crate) fn restore_counters(&mut self, counters: IdCounters) {
        self.counters = counters;
    }

    /// Reinsert a vertex under its existing id.
    pub(crate) fn insert_vertex(&mut self, vertex: Vertex) {
        self.vertices.insert(vertex.id(), vertex);
    }

    /// Reinsert an edge under its existing id and index it.
    pub(crate) fn insert_edge(&mut self, edge: Edge) -> Result<(), InMemoryError> {
        for v in [edge.from, edge.to] {
            if !self.vertices.contains_key(&v) {
                return Err(InMemoryError::VertexNotFound(v));
            }
        }
        if self.pairs.contains_key(&(edge.from, edge.to)) {
            return Err(InMemoryError::DuplicateEdge { from: edge.from, to: edge.to });
        }
        self.index_edge(edge);
        Ok(())
    }

    fn index_edge(&mut self, edge: Edge) {
        self.outgoing.entry(edge.from).or_default().insert(edge.id);
        self.incoming.entry(edge.to).or_default().insert(edge.id);
        self.pairs.insert((edge.from, edge.to), edge.id);
        self.edges.insert(edge.id, edge);
    }

    fn push_vertex(&mut self, tokens: BTreeSet<Token>) -> VertexId {
        let id = VertexId::new(self.counters.next_vertex);
        self.counters.next_vertex += 1;
        self.vertices.insert(id, Vertex::new(id, tokens));
        id
    }

    /// A fresh store holding two empty sentinels joined by an edge with no
    /// witnesses. Returns `(store, start, end)`.
    pub(crate) fn seeded() -> (Self, VertexId, VertexId) {
        let mut store = Self::new();
        let start = store.push_vertex(BTreeSet::new());
        let end = store.push_vertex(BTreeSet::new());
        let id = EdgeId::new(store.counters.next_edge);
        store.counters.next_edge += 1;
        store.index_edge(Edge::new(id, start, end, BTreeSet::new()));
        (store, start, end)
    }

    /// Reinsert a transposition under its existing id and index it.
    pub(crate) fn insert_transposition(
        &mut self,
        transposition: Transposition,
    ) -> Result<(), InMemoryError> {
        for v in &transposition.vertices {
            if !self.vertices.contains_key(v) {
                return Err(InMemoryError::VertexNotFound(*v));
            }
        }
        for v in &transposition.vertices {
            self.memberships.entry(*v).or_default().insert(transposition.id);
        }
        self.transpositions.insert(transposition.id, transposition);
        Ok(())
    }

    /// Swap a vertex's token set, returning the previous one.
    pub(crate) fn replace_tokens(
        &mut self,
        id: VertexId,
        tokens: BTreeSet<Token>,
    ) -> Result<BTreeSet<Token>, InMemoryError> {
        let vertex = self
            .vertices
            .get_mut(&id)
            .ok_or(InMemoryError::VertexNotFound(id))?;
        Ok(vertex.replace_tokens(tokens))
    }

    /// Overwrite an edge's witness set, returning the previous one.
    pub(crate) fn replace_witnesses(
        &mut self,
        id: EdgeId,
        witnesses: BTreeSet<Sigil>,
    ) -> Result<BTreeSet<Sigil>, InMemoryError> {
        let edge = self.edges.get_mut(&id).ok_or(InMemoryError::EdgeNotFound(id))?;
        Ok(std::mem::replace(&mut edge.witnesses, witnesses))
    }
}

impl VariantGraphStore for InMemoryGraphStore {
    type Error = InMemoryError;

    fn create_vertex(&mut self, tokens: BTreeSet<Token>) -> Result<VertexId, Self::Error> {
        Ok(self.push_vertex(tokens))
    }

    fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.keys().copied().collect()
    }

    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn add_tokens(&mut self, id: VertexId, tokens: BTreeSet<Token>) -> Result<(), Self::Error> {
        let vertex = self
            .vertices
            .get_mut(&id)
            .ok_or(InMemoryError::VertexNotFound(id))?;
        vertex.insert_tokens(tokens);
        Ok(())
    }

    fn set_rank(&mut self, id: VertexId, rank: u32) -> Result<(), Self::Error> {
        let vertex = self
            .vertices
            .get_mut(&id)
            .ok_or(InMemoryError::VertexNotFound(id))?;
        vertex.set_rank(rank);
        Ok(())
    }

    fn remove_vertex(&mut self, id: VertexId) -> Result<Vertex, Self::Error> {
        if !self.vertices.contains_key(&id) {
            return Err(InMemoryError::VertexNotFound(id));
        }
        let connected = self.outgoing.get(&id).is_some_and(|s| !s.is_empty())
            || self.incoming.get(&id).is_some_and(|s| !s.is_empty())
            || self.memberships.get(&id).is_some_and(|s| !s.is_empty());
        if connected {
            return Err(InMemoryError::VertexInUse(id));
        }
        self.outgoing.remove(&id);
        self.incoming.remove(&id);
        self.memberships.remove(&id);
        self.vertices
            .remove(&id)
            .ok_or(InMemoryError::VertexNotFound(id))
    }

    fn create_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        witnesses: BTreeSet<Sigil>,
    ) -> Result<EdgeId, Self::Error> {
        let id = EdgeId::new(self.counters.next_edge);
        self.insert_edge(Edge::new(id, from, to, witnesses))?;
        self.counters.next_edge += 1;
        Ok(id)
    }

    fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    fn find_edge(&self, from: VertexId, to: VertexId) -> Option<EdgeId> {
        self.pairs.get(&(from, to)).copied()
    }

    fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges.keys().copied().collect()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn extend_edge(&mut self, id: EdgeId, witnesses: &BTreeSet<Sigil>) -> Result<(), Self::Error> {
        let edge = self.edges.get_mut(&id).ok_or(InMemoryError::EdgeNotFound(id))?;
        edge.witnesses.extend(witnesses.iter().cloned());
        Ok(())
    }

    fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, Self::Error> {
        let edge = self.edges.remove(&id).ok_or(InMemoryError::EdgeNotFound(id))?;
        if let Some(out) = self.outgoing.get_mut(&edge.from) {
            out.remove(&id);
        }
        if let Some(inc) = self.incoming.get_mut(&edge.to) {
            inc.remove(&id);
        }
        self.pairs.remove(&(edge.from, edge.to));
        Ok(edge)
    }

    fn outgoing(&self, vertex: VertexId) -> Vec<EdgeId> {
        self.outgoing
            .get(&vertex)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn incoming(&self, vertex: VertexId) -> Vec<EdgeId> {
        self.incoming
            .get(&vertex)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn create_transposition(
        &mut self,
        vertices: BTreeSet<VertexId>,
    ) -> Result<TranspositionId, Self::Error> {
        let id = TranspositionId::new(self.counters.next_transposition);
        self.insert_transposition(Transposition::new(id, vertices))?;
        self.counters.next_transposition += 1;
        Ok(id)
    }

    fn transposition(&self, id: TranspositionId) -> Option<&Transposition> {
        self.transpositions.get(&id)
    }

    fn transpositions_of(&self, vertex: VertexId) -> Vec<TranspositionId> {
        self.memberships
            .get(&vertex)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn transposition_ids(&self) -> Vec<TranspositionId> {
        self.transpositions.keys().copied().collect()
    }

    fn remove_transposition(&mut self, id: TranspositionId) -> Result<Transposition, Self::Error> {
        let transposition = self
            .transpositions
            .remove(&id)
            .ok_or(InMemoryError::TranspositionNotFound(id))?;
        for v in &transposition.vertices {
            if let Some(set) = self.memberships.get_mut(v) {
                set.remove(&id);
            }
        }
        Ok(transposition)
    }

    fn begin(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        Err(InMemoryError::RollbackUnsupported)
    }

    fn is_transactional(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sigil: &str, ordinal: usize, text: &str) -> BTreeSet<Token> {
        [Token::new(Sigil::from(sigil), ordinal, text, text)].into_iter().collect()
    }

    fn sigils(names: &[&str]) -> BTreeSet<Sigil> {
        names.iter().map(|s| Sigil::from(*s)).collect()
    }

    #[test]
    fn test_ids_increase() {
        let mut store = InMemoryGraphStore::new();
        let v0 = store.create_vertex(BTreeSet::new()).unwrap();
        let v1 = store.create_vertex(tokens("A", 0, "a")).unwrap();

        assert!(v0 < v1);
        assert_eq!(store.vertex_ids(), vec![v0, v1]);
        assert_eq!(store.vertex(v1).unwrap().tokens().len(), 1);
    }

    #[test]
    fn test_edge_indexes() {
        let mut store = InMemoryGraphStore::new();
        let a = store.create_vertex(BTreeSet::new()).unwrap();
        let b = store.create_vertex(BTreeSet::new()).unwrap();
        let e = store.create_edge(a, b, sigils(&["A"])).unwrap();

        assert_eq!(store.find_edge(a, b), Some(e));
        assert_eq!(store.find_edge(b, a), None);
        assert_eq!(store.outgoing(a), vec![e]);
        assert_eq!(store.incoming(b), vec![e]);

        let err = store.create_edge(a, b, sigils(&["B"])).unwrap_err();
        assert_eq!(err, InMemoryError::DuplicateEdge { from: a, to: b });

        store.extend_edge(e, &sigils(&["B"])).unwrap();
        assert_eq!(store.edge(e).unwrap().witnesses, sigils(&["A", "B"]));

        store.remove_edge(e).unwrap();
        assert!(store.outgoing(a).is_empty());
        assert_eq!(store.find_edge(a, b), None);
    }

    #[test]
    fn test_remove_connected_vertex_fails() {
        let mut store = InMemoryGraphStore::new();
        let a = store.create_vertex(BTreeSet::new()).unwrap();
        let b = store.create_vertex(BTreeSet::new()).unwrap();
        let e = store.create_edge(a, b, BTreeSet::new()).unwrap();

        assert_eq!(store.remove_vertex(a).unwrap_err(), InMemoryError::VertexInUse(a));
        store.remove_edge(e).unwrap();
        assert!(store.remove_vertex(a).is_ok());
        assert_eq!(store.vertex_count(), 1);
    }

    #[test]
    fn test_transposition_index() {
        let mut store = InMemoryGraphStore::new();
        let a = store.create_vertex(tokens("A", 0, "x")).unwrap();
        let b = store.create_vertex(tokens("B", 1, "x")).unwrap();
        let t = store.create_transposition([a, b].into_iter().collect()).unwrap();

        assert_eq!(store.transpositions_of(a), vec![t]);
        assert_eq!(store.transpositions_of(b), vec![t]);

        store.remove_transposition(t).unwrap();
        assert!(store.transpositions_of(a).is_empty());
        assert!(store.transposition_ids().is_empty());
    }

    #[test]
    fn test_rollback_unsupported() {
        let mut store = InMemoryGraphStore::new();
        store.begin().unwrap();
        store.create_vertex(BTreeSet::new()).unwrap();
        store.commit().unwrap();
        assert!(!store.is_transactional());
        assert_eq!(store.rollback(), Err(InMemoryError::RollbackUnsupported));
    }

    #[test]
    fn test_snapshot_roundtrip_rebuilds_indexes() {
        let mut store = InMemoryGraphStore::new();
        let a = store.create_vertex(BTreeSet::new()).unwrap();
        let b = store.create_vertex(tokens("A", 0, "x")).unwrap();
        let e = store.create_edge(a, b, sigils(&["A"])).unwrap();

        let snapshot = store.to_snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored =
            InMemoryGraphStore::from_snapshot(serde_json::from_str(&json).unwrap()).unwrap();

        assert_eq!(restored.find_edge(a, b), Some(e));
        assert_eq!(restored.incoming(b), vec![e]);
        assert_eq!(restored.to_snapshot(), snapshot);
    }

    #[test]
    fn test_snapshot_rejects_ids_beyond_counter() {
        let mut store = InMemoryGraphStore::new();
        store.create_vertex(BTreeSet::new()).unwrap();
        let mut snapshot = store.to_snapshot();
        snapshot.counters.next_vertex = 0;

        assert!(matches!(
            InMemoryGraphStore::from_snapshot(snapshot),
            Err(InMemoryError::InvalidSnapshot(_))
        ));
    }
}
