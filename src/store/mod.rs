//! Variant graph storage backends.
//!
//! The graph, the aligners and the post-processing passes are written
//! against [`VariantGraphStore`]; they never touch a concrete arena.
//!
//! Implementations must guarantee deterministic ordering of results:
//! every id list is returned in ascending id order.

pub mod memory;
pub mod journaled;

use std::collections::BTreeSet;

use crate::types::{
    Edge, EdgeId, Sigil, Token, Transposition, TranspositionId, Vertex, VertexId,
};

/// Storage capability for a variant graph.
///
/// All methods are synchronous: collation is CPU-bound and single-threaded.
pub trait VariantGraphStore: Send {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    // ─── Vertices ───

    /// Create a vertex holding `tokens`.
    fn create_vertex(&mut self, tokens: BTreeSet<Token>) -> Result<VertexId, Self::Error>;

    /// Fetch a vertex by id.
    fn vertex(&self, id: VertexId) -> Option<&Vertex>;

    /// All vertex ids.
    fn vertex_ids(&self) -> Vec<VertexId>;

    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Add tokens to a vertex's token set.
    fn add_tokens(&mut self, id: VertexId, tokens: BTreeSet<Token>) -> Result<(), Self::Error>;

    /// Record a vertex's rank.
    fn set_rank(&mut self, id: VertexId, rank: u32) -> Result<(), Self::Error>;

    /// Remove a vertex. Its edges and transpositions must be removed first.
    fn remove_vertex(&mut self, id: VertexId) -> Result<Vertex, Self::Error>;

    // ─── Edges ───

    /// Create an edge. At most one edge may exist per ordered pair.
    fn create_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        witnesses: BTreeSet<Sigil>,
    ) -> Result<EdgeId, Self::Error>;

    /// Fetch an edge by id.
    fn edge(&self, id: EdgeId) -> Option<&Edge>;

    /// Edge from `from` to `to`, if any.
    fn find_edge(&self, from: VertexId, to: VertexId) -> Option<EdgeId>;

    /// All edge ids.
    fn edge_ids(&self) -> Vec<EdgeId>;

    /// Number of edges.
    fn edge_count(&self) -> usize;

    /// Union `witnesses` into an edge's witness set.
    fn extend_edge(&mut self, id: EdgeId, witnesses: &BTreeSet<Sigil>) -> Result<(), Self::Error>;

    /// Remove an edge.
    fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, Self::Error>;

    /// Edges leaving `vertex`.
    fn outgoing(&self, vertex: VertexId) -> Vec<EdgeId>;

    /// Edges entering `vertex`.
    fn incoming(&self, vertex: VertexId) -> Vec<EdgeId>;

    // ─── Transpositions ───

    /// Create a transposition linking `vertices`.
    fn create_transposition(
        &mut self,
        vertices: BTreeSet<VertexId>,
    ) -> Result<TranspositionId, Self::Error>;

    /// Fetch a transposition by id.
    fn transposition(&self, id: TranspositionId) -> Option<&Transposition>;

    /// Transpositions that include `vertex`.
    fn transpositions_of(&self, vertex: VertexId) -> Vec<TranspositionId>;

    /// All transposition ids.
    fn transposition_ids(&self) -> Vec<TranspositionId>;

    /// Remove a transposition.
    fn remove_transposition(&mut self, id: TranspositionId) -> Result<Transposition, Self::Error>;

    // ─── Transactions ───

    /// Open a transaction boundary.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Make every change since `begin` permanent.
    fn commit(&mut self) -> Result<(), Self::Error>;

    /// Undo every change since `begin`.
    fn rollback(&mut self) -> Result<(), Self::Error>;

    /// Whether `rollback` can actually undo changes.
    fn is_transactional(&self) -> bool;
}

pub use memory::{InMemoryError, InMemoryGraphStore};
pub use journaled::{JournalError, JournaledGraphStore};
