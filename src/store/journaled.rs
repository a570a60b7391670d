//! Transactional variant graph store.
//!
//! Wraps [`InMemoryGraphStore`] with an undo journal. `begin` opens the
//! journal, every mutation records its inverse, `commit` discards the
//! journal and `rollback` replays it in reverse, restoring id counters too.
//!
//! With a snapshot path, each commit also writes the committed state as JSON
//! to a temporary file and renames it over the snapshot, so a crash leaves
//! either the previous or the new snapshot on disk.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::memory::{GraphSnapshot, IdCounters, InMemoryError, InMemoryGraphStore};
use super::VariantGraphStore;
use crate::types::{
    Edge, EdgeId, Sigil, Token, Transposition, TranspositionId, Vertex, VertexId,
};

/// Error type for the journaled store.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// Underlying arena error.
    #[error("Store error: {0}")]
    Store(#[from] InMemoryError),

    /// Snapshot file I/O failed.
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failed.
    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `commit` or `rollback` without `begin`.
    #[error("No active transaction")]
    NoActiveTransaction,

    /// `begin` inside an open transaction.
    #[error("Transaction already active")]
    NestedTransaction,
}

/// Inverse of one mutation.
#[derive(Debug, Clone)]
enum UndoOp {
    RemoveVertex(VertexId),
    RestoreTokens(VertexId, BTreeSet<Token>),
    RestoreRank(VertexId, u32),
    InsertVertex(Vertex),
    RemoveEdge(EdgeId),
    RestoreWitnesses(EdgeId, BTreeSet<Sigil>),
    InsertEdge(Edge),
    RemoveTransposition(TranspositionId),
    InsertTransposition(Transposition),
}

#[derive(Debug)]
struct Journal {
    counters: IdCounters,
    ops: Vec<UndoOp>,
}

/// Transactional store with optional JSON snapshot durability.
#[derive(Debug, Default)]
pub struct JournaledGraphStore {
    inner: InMemoryGraphStore,
    journal: Option<Journal>,
    snapshot_path: Option<PathBuf>,
}

impl JournaledGraphStore {
    /// Create an empty, memory-only transactional store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a durable store at `path`.
    ///
    /// Restores the snapshot if the file exists, otherwise starts empty.
    /// Every subsequent commit rewrites the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            let bytes = fs::read(&path)?;
            let snapshot: GraphSnapshot = serde_json::from_slice(&bytes)?;
            debug!(
                path = %path.display(),
                vertices = snapshot.vertices.len(),
                edges = snapshot.edges.len(),
                "Restored graph snapshot"
            );
            InMemoryGraphStore::from_snapshot(snapshot)?
        } else {
            InMemoryGraphStore::new()
        };
        Ok(Self {
            inner,
            journal: None,
            snapshot_path: Some(path),
        })
    }

    /// Snapshot location, if durable.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Whether a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.journal.is_some()
    }

    /// Read-only access to the wrapped arena.
    pub fn inner(&self) -> &InMemoryGraphStore {
        &self.inner
    }

    /// Write the current state to the snapshot path, if any.
    pub fn persist(&self) -> Result<(), JournalError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(&self.inner.to_snapshot())?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "Persisted graph snapshot");
        Ok(())
    }

    fn record(&mut self, op: UndoOp) {
        if let Some(journal) = &mut self.journal {
            journal.ops.push(op);
        }
    }

    fn undo(&mut self, op: UndoOp) -> Result<(), InMemoryError> {
        match op {
            UndoOp::RemoveVertex(id) => {
                self.inner.remove_vertex(id)?;
            }
            UndoOp::RestoreTokens(id, tokens) => {
                self.inner.replace_tokens(id, tokens)?;
            }
            UndoOp::RestoreRank(id, rank) => self.inner.set_rank(id, rank)?,
            UndoOp::InsertVertex(vertex) => self.inner.insert_vertex(vertex),
            UndoOp::RemoveEdge(id) => {
                self.inner.remove_edge(id)?;
            }
            UndoOp::RestoreWitnesses(id, witnesses) => {
                self.inner.replace_witnesses(id, witnesses)?;
            }
            UndoOp::InsertEdge(edge) => self.inner.insert_edge(edge)?,
            UndoOp::RemoveTransposition(id) => {
                self.inner.remove_transposition(id)?;
            }
            UndoOp::InsertTransposition(t) => self.inner.insert_transposition(t)?,
        }
        Ok(())
    }
}

impl VariantGraphStore for JournaledGraphStore {
    type Error = JournalError;

    fn create_vertex(&mut self, tokens: BTreeSet<Token>) -> Result<VertexId, Self::Error> {
        let id = self.inner.create_vertex(tokens)?;
        self.record(UndoOp::RemoveVertex(id));
        Ok(id)
    }

    fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.inner.vertex(id)
    }

    fn vertex_ids(&self) -> Vec<VertexId> {
        self.inner.vertex_ids()
    }

    fn vertex_count(&self) -> usize {
        self.inner.vertex_count()
    }

    fn add_tokens(&mut self, id: VertexId, tokens: BTreeSet<Token>) -> Result<(), Self::Error> {
        let previous = self
            .inner
            .vertex(id)
            .map(|v| v.tokens().clone())
            .ok_or(InMemoryError::VertexNotFound(id))?;
        self.inner.add_tokens(id, tokens)?;
        self.record(UndoOp::RestoreTokens(id, previous));
        Ok(())
    }

    fn set_rank(&mut self, id: VertexId, rank: u32) -> Result<(), Self::Error> {
        let previous = self
            .inner
            .vertex(id)
            .map(Vertex::rank)
            .ok_or(InMemoryError::VertexNotFound(id))?;
        if previous == rank {
            return Ok(());
        }
        self.inner.set_rank(id, rank)?;
        self.record(UndoOp::RestoreRank(id, previous));
        Ok(())
    }

    fn remove_vertex(&mut self, id: VertexId) -> Result<Vertex, Self::Error> {
        let vertex = self.inner.remove_vertex(id)?;
        self.record(UndoOp::InsertVertex(vertex.clone()));
        Ok(vertex)
    }

    fn create_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        witnesses: BTreeSet<Sigil>,
    ) -> Result<EdgeId, Self::Error> {
        let id = self.inner.create_edge(from, to, witnesses)?;
        self.record(UndoOp::RemoveEdge(id));
        Ok(id)
    }

    fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.inner.edge(id)
    }

    fn find_edge(&self, from: VertexId, to: VertexId) -> Option<EdgeId> {
        self.inner.find_edge(from, to)
    }

    fn edge_ids(&self) -> Vec<EdgeId> {
        self.inner.edge_ids()
    }

    fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    fn extend_edge(&mut self, id: EdgeId, witnesses: &BTreeSet<Sigil>) -> Result<(), Self::Error> {
        let previous = self
            .inner
            .edge(id)
            .map(|e| e.witnesses.clone())
            .ok_or(InMemoryError::EdgeNotFound(id))?;
        self.inner.extend_edge(id, witnesses)?;
        self.record(UndoOp::RestoreWitnesses(id, previous));
        Ok(())
    }

    fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, Self::Error> {
        let edge = self.inner.remove_edge(id)?;
        self.record(UndoOp::InsertEdge(edge.clone()));
        Ok(edge)
    }

    fn outgoing(&self, vertex: VertexId) -> Vec<EdgeId> {
        self.inner.outgoing(vertex)
    }

    fn incoming(&self, vertex: VertexId) -> Vec<EdgeId> {
        self.inner.incoming(vertex)
    }

    fn create_transposition(
        &mut self,
        vertices: BTreeSet<VertexId>,
    ) -> Result<TranspositionId, Self::Error> {
        let id = self.inner.create_transposition(vertices)?;
        self.record(UndoOp::RemoveTransposition(id));
        Ok(id)
    }

    fn transposition(&self, id: TranspositionId) -> Option<&Transposition> {
        self.inner.transposition(id)
    }

    fn transpositions_of(&self, vertex: VertexId) -> Vec<TranspositionId> {
        self.inner.transpositions_of(vertex)
    }

    fn transposition_ids(&self) -> Vec<TranspositionId> {
        self.inner.transposition_ids()
    }

    fn remove_transposition(&mut self, id: TranspositionId) -> Result<Transposition, Self::Error> {
        let transposition = self.inner.remove_transposition(id)?;
        self.record(UndoOp::InsertTransposition(transposition.clone()));
        Ok(transposition)
    }

    fn begin(&mut self) -> Result<(), Self::Error> {
        if self.journal.is_some() {
            return Err(JournalError::NestedTransaction);
        }
        self.journal = Some(Journal {
            counters: self.inner.counters(),
            ops: Vec::new(),
        });
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        let journal = self.journal.take().ok_or(JournalError::NoActiveTransaction)?;
        debug!(operations = journal.ops.len(), "Committed graph transaction");
        self.persist()
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        let journal = self.journal.take().ok_or(JournalError::NoActiveTransaction)?;
        let undone = journal.ops.len();
        for op in journal.ops.into_iter().rev() {
            self.undo(op)?;
        }
        self.inner.restore_counters(journal.counters);
        debug!(operations = undone, "Rolled back graph transaction");
        Ok(())
    }

    fn is_transactional(&self) -> bool {
        true
    }
}
