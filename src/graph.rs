//! The variant graph.
//!
//! A directed acyclic graph between two token-less sentinels, `start` and
//! `end`. Every witness is a path from `start` to `end` along the edges
//! whose witness set contains its sigil; the tokens met along that path, in
//! order, are exactly the witness's tokens.
//!
//! ## Invariants
//!
//! - `start` has no incoming edges, `end` has no outgoing edges
//! - every vertex is reachable from `start` and reaches `end`
//! - at most one edge per ordered vertex pair
//! - after [`VariantGraph::rank`], rank strictly increases along every edge
//!
//! All mutation goes through the methods here so the invariants hold after
//! every merged witness. The graph is generic over its [`VariantGraphStore`].

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::trace;

use crate::canonical::canonical_hash_hex;
use crate::store::{InMemoryGraphStore, VariantGraphStore};
use crate::types::{
    Edge, EdgeId, Sigil, Token, Transposition, TranspositionId, Vertex, VertexId, Witness,
};

/// Error type for graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// `connect(v, v, ..)`.
    #[error("Self-loop on vertex {0}")]
    SelfLoop(VertexId),

    /// A transposition needs at least two distinct vertices.
    #[error("Transposition needs at least 2 distinct vertices, got {0}")]
    TranspositionTooSmall(usize),

    /// Sentinels cannot be transposed or hold tokens.
    #[error("Sentinel vertex {0} cannot be used here")]
    SentinelVertex(VertexId),

    /// Vertex id not present in the store.
    #[error("Unknown vertex: {0}")]
    UnknownVertex(VertexId),

    /// Vertex already holds a token of this witness.
    #[error("Vertex {vertex} already holds a token of witness '{witness}'")]
    DuplicateWitnessToken {
        /// Target vertex.
        vertex: VertexId,
        /// Witness sigil.
        witness: Sigil,
    },

    /// Operation needs ranks, but the edge set changed since the last ranking.
    #[error("Graph is not ranked")]
    NotRanked,

    /// Ranking found vertices on a cycle.
    #[error("Cycle detected: {0} vertices could not be ranked")]
    Cycle(usize),

    /// A non-empty store without recognizable sentinels.
    #[error("Store holds no {0} sentinel")]
    MissingSentinel(&'static str),

    /// `validate` found a broken invariant.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Storage backend error.
    #[error("Store error: {0}")]
    Store(String),
}

impl GraphError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }
}

/// Variant graph over a storage backend.
pub struct VariantGraph<S: VariantGraphStore = InMemoryGraphStore> {
    pub(crate) store: S,
    start: VertexId,
    end: VertexId,
    pub(crate) ranked: bool,
}

impl VariantGraph<InMemoryGraphStore> {
    /// Create an empty in-memory graph: two sentinels and a placeholder edge.
    pub fn new() -> Self {
        let (store, start, end) = InMemoryGraphStore::seeded();
        Self {
            store,
            start,
            end,
            ranked: false,
        }
    }
}

impl Default for VariantGraph<InMemoryGraphStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: VariantGraphStore> VariantGraph<S> {
    /// Build a graph on top of a store.
    ///
    /// An empty store gets fresh sentinels and the placeholder edge. A
    /// non-empty store (e.g. a restored snapshot) must already hold them:
    /// `start` is the lowest token-less vertex without incoming edges, `end`
    /// the lowest token-less vertex without outgoing edges.
    pub fn with_store(mut store: S) -> Result<Self, GraphError> {
        if store.vertex_count() == 0 {
            let start = store.create_vertex(BTreeSet::new()).map_err(GraphError::from_store)?;
            let end = store.create_vertex(BTreeSet::new()).map_err(GraphError::from_store)?;
            store
                .create_edge(start, end, BTreeSet::new())
                .map_err(GraphError::from_store)?;
            return Ok(Self {
                store,
                start,
                end,
                ranked: false,
            });
        }

        let ids = store.vertex_ids();
        let is_empty = |id: &VertexId| store.vertex(*id).is_some_and(Vertex::is_empty);
        let start = ids
            .iter()
            .copied()
            .find(|id| is_empty(id) && store.incoming(*id).is_empty())
            .ok_or(GraphError::MissingSentinel("start"))?;
        let end = ids
            .iter()
            .copied()
            .find(|id| *id != start && is_empty(id) && store.outgoing(*id).is_empty())
            .ok_or(GraphError::MissingSentinel("end"))?;

        Ok(Self {
            store,
            start,
            end,
            ranked: false,
        })
    }

    /// The start sentinel.
    pub fn start(&self) -> VertexId {
        self.start
    }

    /// The end sentinel.
    pub fn end(&self) -> VertexId {
        self.end
    }

    /// Whether `id` is one of the sentinels.
    pub fn is_sentinel(&self, id: VertexId) -> bool {
        id == self.start || id == self.end
    }

    /// The storage backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the graph, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Whether ranks reflect the current edge set.
    pub fn is_ranked(&self) -> bool {
        self.ranked
    }

    pub(crate) fn require_ranked(&self) -> Result<(), GraphError> {
        if self.ranked {
            Ok(())
        } else {
            Err(GraphError::NotRanked)
        }
    }

    pub(crate) fn mark_unranked(&mut self) {
        self.ranked = false;
    }

    /// Fetch a vertex.
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.store.vertex(id)
    }

    /// Rank of a vertex (meaningful only when ranked).
    pub fn rank_of(&self, id: VertexId) -> Option<u32> {
        self.store.vertex(id).map(Vertex::rank)
    }

    /// Number of vertices, sentinels included.
    pub fn vertex_count(&self) -> usize {
        self.store.vertex_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.store.edge_count()
    }

    /// Number of transpositions.
    pub fn transposition_count(&self) -> usize {
        self.store.transposition_ids().len()
    }

    fn require_vertex(&self, id: VertexId) -> Result<&Vertex, GraphError> {
        self.store.vertex(id).ok_or(GraphError::UnknownVertex(id))
    }

    // ─── Mutation ───

    /// Add a vertex holding a single token.
    pub fn add(&mut self, token: Token) -> Result<VertexId, GraphError> {
        let id = self
            .store
            .create_vertex([token].into_iter().collect())
            .map_err(GraphError::from_store)?;
        self.ranked = false;
        trace!(vertex = %id, "Added vertex");
        Ok(id)
    }

    /// Merge one more witness's token into an existing vertex.
    pub fn merge_token(&mut self, vertex: VertexId, token: Token) -> Result<(), GraphError> {
        if self.is_sentinel(vertex) {
            return Err(GraphError::SentinelVertex(vertex));
        }
        if self.require_vertex(vertex)?.has_witness(token.witness()) {
            return Err(GraphError::DuplicateWitnessToken {
                vertex,
                witness: token.witness().clone(),
            });
        }
        trace!(vertex = %vertex, token = %token, "Merged token");
        self.store
            .add_tokens(vertex, [token].into_iter().collect())
            .map_err(GraphError::from_store)
    }

    /// Connect `from` to `to` for `witnesses`.
    ///
    /// Extends the existing edge for the pair if there is one. Leaving
    /// `start` toward anything but `end` first removes the start→end
    /// placeholder, provided it still carries no witnesses.
    pub fn connect(
        &mut self,
        from: VertexId,
        to: VertexId,
        witnesses: &BTreeSet<Sigil>,
    ) -> Result<EdgeId, GraphError> {
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        self.require_vertex(from)?;
        self.require_vertex(to)?;

        if from == self.start && to != self.end {
            if let Some(placeholder) = self.store.find_edge(self.start, self.end) {
                let unused = self
                    .store
                    .edge(placeholder)
                    .is_some_and(|e| e.witnesses.is_empty());
                if unused {
                    self.store.remove_edge(placeholder).map_err(GraphError::from_store)?;
                    trace!(edge = %placeholder, "Removed placeholder edge");
                }
            }
        }

        if let Some(existing) = self.store.find_edge(from, to) {
            self.store
                .extend_edge(existing, witnesses)
                .map_err(GraphError::from_store)?;
            trace!(edge = %existing, "Extended edge");
            return Ok(existing);
        }

        let id = self
            .store
            .create_edge(from, to, witnesses.clone())
            .map_err(GraphError::from_store)?;
        self.ranked = false;
        trace!(edge = %id, from = %from, to = %to, "Created edge");
        Ok(id)
    }

    /// Link vertices holding the same reading at crossing positions.
    ///
    /// Order-insensitive: returns the existing transposition when one links
    /// exactly the same set.
    pub fn transpose(
        &mut self,
        vertices: impl IntoIterator<Item = VertexId>,
    ) -> Result<TranspositionId, GraphError> {
        let set: BTreeSet<VertexId> = vertices.into_iter().collect();
        if set.len() < 2 {
            return Err(GraphError::TranspositionTooSmall(set.len()));
        }
        for v in &set {
            if self.is_sentinel(*v) {
                return Err(GraphError::SentinelVertex(*v));
            }
            self.require_vertex(*v)?;
        }
        if let Some(existing) = self.find_transposition(&set) {
            return Ok(existing);
        }
        let id = self
            .store
            .create_transposition(set)
            .map_err(GraphError::from_store)?;
        trace!(transposition = %id, "Created transposition");
        Ok(id)
    }

    pub(crate) fn find_transposition(&self, set: &BTreeSet<VertexId>) -> Option<TranspositionId> {
        let first = set.iter().next()?;
        self.store
            .transpositions_of(*first)
            .into_iter()
            .find(|t| self.store.transposition(*t).is_some_and(|t| &t.vertices == set))
    }

    // ─── Read-only views ───

    /// The edge joining `a` and `b`, in either direction.
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<&Edge> {
        self.store
            .find_edge(a, b)
            .or_else(|| self.store.find_edge(b, a))
            .and_then(|id| self.store.edge(id))
    }

    /// Outgoing edges of a vertex, ascending edge id.
    pub fn outgoing(&self, vertex: VertexId) -> Vec<&Edge> {
        self.store
            .outgoing(vertex)
            .into_iter()
            .filter_map(|id| self.store.edge(id))
            .collect()
    }

    /// Incoming edges of a vertex, ascending edge id.
    pub fn incoming(&self, vertex: VertexId) -> Vec<&Edge> {
        self.store
            .incoming(vertex)
            .into_iter()
            .filter_map(|id| self.store.edge(id))
            .collect()
    }

    /// Vertices in topological order, starting at `start`.
    ///
    /// With a non-empty filter only edges carrying one of the given
    /// witnesses are followed.
    pub fn vertices(&self, filter: Option<&BTreeSet<Sigil>>) -> Vec<&Vertex> {
        self.topological_order(filter)
            .into_iter()
            .filter_map(|id| self.store.vertex(id))
            .collect()
    }

    /// Edges in topological order of their source vertex.
    pub fn edges(&self, filter: Option<&BTreeSet<Sigil>>) -> Vec<&Edge> {
        self.topological_order(filter)
            .into_iter()
            .flat_map(|id| self.outgoing(id))
            .filter(|e| e.traversable_with(filter))
            .collect()
    }

    /// Sigils of every merged witness.
    pub fn witnesses(&self) -> BTreeSet<Sigil> {
        self.outgoing(self.start)
            .into_iter()
            .flat_map(|e| e.witnesses.iter().cloned())
            .collect()
    }

    /// All transpositions, ascending id.
    pub fn transpositions(&self) -> Vec<&Transposition> {
        self.store
            .transposition_ids()
            .into_iter()
            .filter_map(|id| self.store.transposition(id))
            .collect()
    }

    /// Topological order by in-degree exhaustion from `start`.
    pub(crate) fn topological_order(&self, filter: Option<&BTreeSet<Sigil>>) -> Vec<VertexId> {
        let reachable = self.reachable(self.start, filter);

        let mut in_degree: BTreeMap<VertexId, usize> = BTreeMap::new();
        for v in &reachable {
            let n = self
                .incoming(*v)
                .into_iter()
                .filter(|e| e.traversable_with(filter) && reachable.contains(&e.from))
                .count();
            in_degree.insert(*v, n);
        }

        let mut order = Vec::with_capacity(reachable.len());
        let mut queue = VecDeque::from([self.start]);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            for edge in self.outgoing(v) {
                if !edge.traversable_with(filter) {
                    continue;
                }
                if let Some(n) = in_degree.get_mut(&edge.to) {
                    *n -= 1;
                    if *n == 0 {
                        queue.push_back(edge.to);
                    }
                }
            }
        }
        order
    }

    fn reachable(&self, from: VertexId, filter: Option<&BTreeSet<Sigil>>) -> BTreeSet<VertexId> {
        let mut seen = BTreeSet::from([from]);
        let mut stack = vec![from];
        while let Some(v) = stack.pop() {
            for edge in self.outgoing(v) {
                if edge.traversable_with(filter) && seen.insert(edge.to) {
                    stack.push(edge.to);
                }
            }
        }
        seen
    }

    fn reaches_end(&self) -> BTreeSet<VertexId> {
        let mut seen = BTreeSet::from([self.end]);
        let mut stack = vec![self.end];
        while let Some(v) = stack.pop() {
            for edge in self.incoming(v) {
                if seen.insert(edge.from) {
                    stack.push(edge.from);
                }
            }
        }
        seen
    }

    /// Tokens read by `witness` along its path from `start` to `end`.
    pub fn witness_path(&self, witness: &Sigil) -> Result<Vec<Token>, GraphError> {
        let filter = BTreeSet::from([witness.clone()]);
        let mut tokens = Vec::new();
        let mut current = self.start;
        let mut steps = 0;
        while current != self.end {
            let next: Vec<&Edge> = self
                .outgoing(current)
                .into_iter()
                .filter(|e| !e.witnesses.is_empty() && e.traversable_with(Some(&filter)))
                .collect();
            let edge = match next.as_slice() {
                [edge] => *edge,
                [] => {
                    return Err(GraphError::InvariantViolation(format!(
                        "witness '{witness}' stops at {current}"
                    )))
                }
                _ => {
                    return Err(GraphError::InvariantViolation(format!(
                        "witness '{witness}' branches at {current}"
                    )))
                }
            };
            steps += 1;
            if steps > self.vertex_count() {
                return Err(GraphError::InvariantViolation(format!(
                    "witness '{witness}' path does not terminate"
                )));
            }
            current = edge.to;
            let vertex = self.require_vertex(current)?;
            tokens.extend(vertex.tokens_of(witness).cloned());
        }
        Ok(tokens)
    }

    /// Check every structural invariant against the merged witnesses.
    pub fn validate(&self, witnesses: &[Witness]) -> Result<(), GraphError> {
        let violation = |msg: String| Err(GraphError::InvariantViolation(msg));

        if !self.store.incoming(self.start).is_empty() {
            return violation("start has incoming edges".into());
        }
        if !self.store.outgoing(self.end).is_empty() {
            return violation("end has outgoing edges".into());
        }

        let from_start = self.reachable(self.start, None);
        let to_end = self.reaches_end();
        for id in self.store.vertex_ids() {
            if !from_start.contains(&id) {
                return violation(format!("{id} is unreachable from start"));
            }
            if !to_end.contains(&id) {
                return violation(format!("{id} does not reach end"));
            }
        }

        let expected: BTreeSet<Sigil> = witnesses.iter().map(|w| w.sigil().clone()).collect();
        let present = self.witnesses();
        if present != expected {
            return violation(format!(
                "graph holds witnesses {present:?}, expected {expected:?}"
            ));
        }

        for witness in witnesses {
            let path = self.witness_path(witness.sigil())?;
            let same = path.len() == witness.len()
                && path
                    .iter()
                    .zip(witness.tokens())
                    .all(|(a, b)| a == b && a.content() == b.content());
            if !same {
                return violation(format!(
                    "path of witness '{}' does not reproduce its tokens",
                    witness.sigil()
                ));
            }
        }

        if self.ranked {
            if self.rank_of(self.start) != Some(0) {
                return violation("start is not at rank 0".into());
            }
            for id in self.store.edge_ids() {
                if let Some(edge) = self.store.edge(id) {
                    if self.rank_of(edge.to) <= self.rank_of(edge.from) {
                        return violation(format!("rank does not increase along {edge}"));
                    }
                }
            }
        }

        for t in self.transpositions() {
            if t.vertices.len() < 2 || t.vertices.iter().any(|v| self.is_sentinel(*v)) {
                return violation(format!("malformed transposition {t}"));
            }
        }

        Ok(())
    }

    /// Deterministic hash of the graph's structure.
    ///
    /// Vertices are identified by their token keys, so two graphs with the
    /// same shape but different id allocation hash identically.
    pub fn fingerprint(&self) -> String {
        let key_of = |id: VertexId| -> String {
            if id == self.start {
                return "^".to_string();
            }
            if id == self.end {
                return "$".to_string();
            }
            self.store
                .vertex(id)
                .map(|v| {
                    v.token_keys()
                        .iter()
                        .map(|(s, o)| format!("{s}:{o}"))
                        .collect::<Vec<_>>()
                        .join("|")
                })
                .unwrap_or_default()
        };

        let mut vertices: Vec<String> = self.store.vertex_ids().into_iter().map(key_of).collect();
        vertices.sort();

        let mut edges: Vec<(String, String, Vec<String>)> = self
            .store
            .edge_ids()
            .into_iter()
            .filter_map(|id| self.store.edge(id))
            .map(|e| {
                (
                    key_of(e.from),
                    key_of(e.to),
                    e.witnesses.iter().map(|s| s.as_str().to_string()).collect(),
                )
            })
            .collect();
        edges.sort();

        let mut transpositions: Vec<Vec<String>> = self
            .transpositions()
            .into_iter()
            .map(|t| {
                let mut keys: Vec<String> = t.vertices.iter().map(|v| key_of(*v)).collect();
                keys.sort();
                keys
            })
            .collect();
        transpositions.sort();

        #[derive(Serialize)]
        struct Shape {
            vertices: Vec<String>,
            edges: Vec<(String, String, Vec<String>)>,
            transpositions: Vec<Vec<String>>,
        }

        canonical_hash_hex(&Shape {
            vertices,
            edges,
            transpositions,
        })
    }
}

impl<S: VariantGraphStore> std::fmt::Debug for VariantGraph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariantGraph")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("vertices", &self.store.vertex_count())
            .field("edges", &self.store.edge_count())
            .field("ranked", &self.ranked)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JournaledGraphStore;

    fn tok(sigil: &str, ordinal: usize, text: &str) -> Token {
        Token::new(Sigil::from(sigil), ordinal, text, text)
    }

    fn sigils(names: &[&str]) -> BTreeSet<Sigil> {
        names.iter().map(|s| Sigil::from(*s)).collect()
    }

    #[test]
    fn test_new_graph_has_placeholder() {
        let graph = VariantGraph::new();
        let placeholder = graph.edge_between(graph.start(), graph.end()).unwrap();

        assert!(placeholder.witnesses.is_empty());
        assert_eq!(graph.vertex_count(), 2);
        assert!(graph.witnesses().is_empty());
        assert!(graph.validate(&[]).is_ok());
    }

    #[test]
    fn test_connect_from_start_removes_placeholder() {
        let mut graph = VariantGraph::new();
        let (start, end) = (graph.start(), graph.end());
        let v = graph.add(tok("A", 0, "a")).unwrap();
        graph.connect(start, v, &sigils(&["A"])).unwrap();
        graph.connect(v, end, &sigils(&["A"])).unwrap();

        assert!(graph.edge_between(start, end).is_none());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_connect_start_end_extends_placeholder() {
        let mut graph = VariantGraph::new();
        let (start, end) = (graph.start(), graph.end());
        let placeholder = graph.connect(start, end, &sigils(&["A"])).unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.outgoing(start)[0].id, placeholder);
        assert_eq!(graph.witnesses(), sigils(&["A"]));
    }

    #[test]
    fn test_used_start_end_edge_survives() {
        let mut graph = VariantGraph::new();
        let (start, end) = (graph.start(), graph.end());
        graph.connect(start, end, &sigils(&["A"])).unwrap();
        let v = graph.add(tok("B", 0, "b")).unwrap();
        graph.connect(start, v, &sigils(&["B"])).unwrap();

        assert!(graph.edge_between(start, end).is_some());
    }

    #[test]
    fn test_connect_unions_witness_sets() {
        let mut graph = VariantGraph::new();
        let a = graph.add(tok("A", 0, "x")).unwrap();
        let b = graph.add(tok("A", 1, "y")).unwrap();
        let e1 = graph.connect(a, b, &sigils(&["A"])).unwrap();
        let e2 = graph.connect(a, b, &sigils(&["B"])).unwrap();

        assert_eq!(e1, e2);
        assert_eq!(graph.edge_between(b, a).unwrap().witnesses, sigils(&["A", "B"]));
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut graph = VariantGraph::new();
        let a = graph.add(tok("A", 0, "x")).unwrap();

        assert_eq!(graph.connect(a, a, &sigils(&["A"])), Err(GraphError::SelfLoop(a)));
    }

    #[test]
    fn test_merge_token_rejects_second_token_of_witness() {
        let mut graph = VariantGraph::new();
        let v = graph.add(tok("A", 0, "x")).unwrap();
        graph.merge_token(v, tok("B", 0, "x")).unwrap();

        let err = graph.merge_token(v, tok("A", 3, "x")).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateWitnessToken { .. }));
        assert_eq!(graph.vertex(v).unwrap().tokens().len(), 2);
    }

    #[test]
    fn test_transpose_is_order_insensitive() {
        let mut graph = VariantGraph::new();
        let a = graph.add(tok("A", 0, "x")).unwrap();
        let b = graph.add(tok("B", 1, "x")).unwrap();

        let t1 = graph.transpose([a, b]).unwrap();
        let t2 = graph.transpose([b, a]).unwrap();
        assert_eq!(t1, t2);
        assert_eq!(graph.transposition_count(), 1);
    }

    #[test]
    fn test_transpose_validation() {
        let mut graph = VariantGraph::new();
        let a = graph.add(tok("A", 0, "x")).unwrap();
        let start = graph.start();

        assert_eq!(graph.transpose([a, a]), Err(GraphError::TranspositionTooSmall(1)));
        assert_eq!(graph.transpose([a, start]), Err(GraphError::SentinelVertex(start)));
    }

    #[test]
    fn test_vertices_topological_and_filtered() {
        let mut graph = VariantGraph::new();
        let (start, end) = (graph.start(), graph.end());
        let a = graph.add(tok("A", 0, "a")).unwrap();
        let b = graph.add(tok("B", 0, "b")).unwrap();
        graph.connect(start, a, &sigils(&["A"])).unwrap();
        graph.connect(a, end, &sigils(&["A"])).unwrap();
        graph.connect(start, b, &sigils(&["B"])).unwrap();
        graph.connect(b, end, &sigils(&["B"])).unwrap();

        let all: Vec<VertexId> = graph.vertices(None).iter().map(|v| v.id()).collect();
        assert_eq!(all.first(), Some(&start));
        assert_eq!(all.last(), Some(&end));
        assert_eq!(all.len(), 4);

        let only_b: Vec<VertexId> =
            graph.vertices(Some(&sigils(&["B"]))).iter().map(|v| v.id()).collect();
        assert_eq!(only_b, vec![start, b, end]);
        assert_eq!(graph.edges(Some(&sigils(&["A"]))).len(), 2);
    }

    #[test]
    fn test_graph_over_journaled_store() {
        let mut graph = VariantGraph::with_store(JournaledGraphStore::new()).unwrap();
        let v = graph.add(tok("A", 0, "a")).unwrap();
        let (start, end) = (graph.start(), graph.end());
        graph.connect(start, v, &sigils(&["A"])).unwrap();
        graph.connect(v, end, &sigils(&["A"])).unwrap();

        let store = graph.into_store();
        let reopened = VariantGraph::with_store(store).unwrap();
        assert_eq!(reopened.start(), start);
        assert_eq!(reopened.end(), end);
        assert!(reopened
            .validate(&[Witness::from_words("A", ["a"])])
            .is_ok());
    }

    #[test]
    fn test_fingerprint_ignores_ids() {
        let mut g1 = VariantGraph::new();
        let x = g1.add(tok("A", 0, "x")).unwrap();
        let y = g1.add(tok("A", 1, "y")).unwrap();
        g1.connect(g1.start(), x, &sigils(&["A"])).unwrap();
        g1.connect(x, y, &sigils(&["A"])).unwrap();
        g1.connect(y, g1.end(), &sigils(&["A"])).unwrap();

        let mut g2 = VariantGraph::new();
        let y = g2.add(tok("A", 1, "y")).unwrap();
        let x = g2.add(tok("A", 0, "x")).unwrap();
        g2.connect(g2.start(), x, &sigils(&["A"])).unwrap();
        g2.connect(x, y, &sigils(&["A"])).unwrap();
        g2.connect(y, g2.end(), &sigils(&["A"])).unwrap();

        assert_eq!(g1.fingerprint(), g2.fingerprint());
    }
}
