//! Collation sessions.
//!
//! A session owns one variant graph and the configuration it is built with.
//! Witnesses are merged strictly one after another; each merge runs between
//! `begin` and `commit` on the graph store.
//!
//! ## Failure Model
//!
//! | Failure | Detected | Effect |
//! |---------|----------|--------|
//! | Duplicate sigil | before any mutation | nothing merged |
//! | Witness count / length limit | before any mutation | nothing merged |
//! | Alignment cell or match limit | before the witness's transaction | earlier witnesses kept |
//! | Graph or store error | during the merge | rolled back, or session poisoned |
//!
//! A store that cannot roll back leaves a half-merged graph behind, so the
//! session refuses all further work once that happens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::align::{merge, AlignError, Alignment, MergeOutcome};
use crate::comparator::TokenComparator;
use crate::config::CollationConfig;
use crate::graph::{GraphError, VariantGraph};
use crate::projection::{AlignmentTable, Apparatus};
use crate::store::{InMemoryGraphStore, VariantGraphStore};
use crate::types::{LimitViolation, Sigil, Witness};
use crate::COLLATION_SCHEMA_VERSION;

/// Error type for collation runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollationError {
    /// Sigil repeated in the input or already merged.
    #[error("Duplicate witness sigil: {0}")]
    DuplicateSigil(Sigil),

    /// Input exceeds a configured limit.
    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(#[from] LimitViolation),

    /// Graph operation failed.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// An earlier failure left the graph unusable.
    #[error("Session is poisoned by an earlier failed merge")]
    Poisoned,

    /// Commit failed after a successful merge.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// The graph was joined for the apparatus; no more witnesses can merge.
    #[error("Session is sealed: the graph has been joined")]
    Sealed,
}

impl From<AlignError> for CollationError {
    fn from(e: AlignError) -> Self {
        match e {
            AlignError::Graph(e) => CollationError::Graph(e),
            AlignError::Limit(e) => CollationError::ResourceLimit(e),
        }
    }
}

/// Merge counts for one witness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessReport {
    /// Witness sigil.
    pub sigil: Sigil,
    /// Tokens that joined existing vertices.
    pub matched: usize,
    /// Tokens that got new vertices.
    pub added: usize,
    /// Transpositions linked.
    pub transposed: usize,
}

impl WitnessReport {
    fn new(sigil: Sigil, outcome: MergeOutcome) -> Self {
        Self {
            sigil,
            matched: outcome.matched,
            added: outcome.added,
            transposed: outcome.transposed,
        }
    }
}

/// Identity of a merged witness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessDigest {
    /// Witness sigil.
    pub sigil: Sigil,
    /// Number of tokens.
    pub token_count: usize,
    /// SHA-256 of the canonical content.
    pub content_hash: String,
}

impl WitnessDigest {
    /// Digest a witness.
    pub fn of(witness: &Witness) -> Self {
        Self {
            sigil: witness.sigil().clone(),
            token_count: witness.len(),
            content_hash: witness.content_hash(),
        }
    }
}

/// Everything needed to identify and reproduce a collation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollationSummary {
    /// Session identifier.
    pub session_id: Uuid,
    /// Schema version of the exported types.
    pub schema_version: String,
    /// `params_hash` of the config.
    pub config_hash: String,
    /// Merged witnesses, in merge order.
    pub witnesses: Vec<WitnessDigest>,
    /// Vertices, sentinels included.
    pub vertex_count: usize,
    /// Edges.
    pub edge_count: usize,
    /// Transpositions.
    pub transposition_count: usize,
    /// Structural fingerprint of the graph.
    pub graph_fingerprint: String,
    /// When the summary was taken.
    pub collated_at: DateTime<Utc>,
}

/// One collation run.
pub struct CollationSession<S: VariantGraphStore = InMemoryGraphStore> {
    id: Uuid,
    config: CollationConfig,
    comparator: Box<dyn TokenComparator>,
    graph: VariantGraph<S>,
    merged: Vec<WitnessDigest>,
    poisoned: bool,
    sealed: bool,
}

impl CollationSession<InMemoryGraphStore> {
    /// Create a session over a fresh in-memory graph.
    pub fn new(config: CollationConfig) -> Self {
        let comparator = config.comparator.build();
        Self {
            id: Uuid::new_v4(),
            config,
            comparator,
            graph: VariantGraph::new(),
            merged: Vec::new(),
            poisoned: false,
            sealed: false,
        }
    }
}

impl<S: VariantGraphStore> CollationSession<S> {
    /// Create a session over a caller-supplied store.
    ///
    /// The store must be empty.
    pub fn with_store(config: CollationConfig, store: S) -> Result<Self, CollationError> {
        if store.vertex_count() > 0 {
            return Err(GraphError::InvariantViolation(
                "a new session needs an empty store".to_string(),
            )
            .into());
        }
        let graph = VariantGraph::with_store(store)?;
        let comparator = config.comparator.build();
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            comparator,
            graph,
            merged: Vec::new(),
            poisoned: false,
            sealed: false,
        })
    }

    /// Replace the comparator built from the config.
    ///
    /// Must be called before the first witness is merged.
    pub fn with_comparator(mut self, comparator: Box<dyn TokenComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run configuration.
    pub fn config(&self) -> &CollationConfig {
        &self.config
    }

    /// The graph built so far.
    pub fn graph(&self) -> &VariantGraph<S> {
        &self.graph
    }

    /// Consume the session, returning its graph.
    pub fn into_graph(self) -> VariantGraph<S> {
        self.graph
    }

    /// Whether a failed merge made the session unusable.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Sigils merged so far, in merge order.
    pub fn sigils(&self) -> Vec<Sigil> {
        self.merged.iter().map(|d| d.sigil.clone()).collect()
    }

    /// Merge `witnesses` into the graph, in order.
    ///
    /// The whole batch is validated before anything is merged. If a later
    /// witness fails, the witnesses before it stay merged.
    pub fn collate(&mut self, witnesses: &[Witness]) -> Result<Vec<WitnessReport>, CollationError> {
        if self.poisoned {
            return Err(CollationError::Poisoned);
        }
        if self.sealed {
            return Err(CollationError::Sealed);
        }
        self.validate_batch(witnesses)?;

        let started = Instant::now();
        let mut reports = Vec::with_capacity(witnesses.len());
        for witness in witnesses {
            reports.push(self.merge_one(witness)?);
        }

        info!(
            session_id = %self.id,
            witnesses = witnesses.len(),
            total_witnesses = self.merged.len(),
            vertices = self.graph.vertex_count(),
            edges = self.graph.edge_count(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Collation complete"
        );
        Ok(reports)
    }

    fn validate_batch(&self, witnesses: &[Witness]) -> Result<(), CollationError> {
        let mut seen: BTreeSet<&Sigil> = self.merged.iter().map(|d| &d.sigil).collect();
        for witness in witnesses {
            if !seen.insert(witness.sigil()) {
                return Err(CollationError::DuplicateSigil(witness.sigil().clone()));
            }
        }

        let limits = &self.config.limits;
        limits.check_witness_count(self.merged.len() + witnesses.len())?;
        for witness in witnesses {
            limits.check_witness_length(witness.sigil(), witness.len())?;
        }
        Ok(())
    }

    fn merge_one(&mut self, witness: &Witness) -> Result<WitnessReport, CollationError> {
        self.config.limits.check_alignment_cells(
            witness.sigil(),
            self.graph.vertex_count(),
            witness.len(),
        )?;

        let started = Instant::now();
        let alignment = self.plan(witness)?;
        self.graph.store.begin().map_err(GraphError::from_store)?;

        let outcome = match merge(&mut self.graph, witness, &alignment) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.abort(witness.sigil(), &e);
                return Err(e.into());
            }
        };

        if let Err(e) = self.graph.store.commit() {
            self.poison(witness.sigil(), &e.to_string());
            return Err(CollationError::TransactionFailed(e.to_string()));
        }

        self.merged.push(WitnessDigest::of(witness));
        info!(
            session_id = %self.id,
            witness = %witness.sigil(),
            tokens = witness.len(),
            matched = outcome.matched,
            added = outcome.added,
            transposed = outcome.transposed,
            latency_ms = started.elapsed().as_millis() as u64,
            "Merged witness"
        );
        Ok(WitnessReport::new(witness.sigil().clone(), outcome))
    }

    /// Rank the graph and align `witness`; nothing but ranks is written.
    fn plan(&mut self, witness: &Witness) -> Result<Alignment, CollationError> {
        self.graph.rank()?;
        let alignment = self.config.algorithm.align_within(
            &self.graph,
            witness,
            self.comparator.as_ref(),
            &self.config.limits,
        )?;
        debug!(
            witness = %witness.sigil(),
            matched = alignment.matched(),
            transpositions = alignment.transpositions.len(),
            "Alignment planned"
        );
        Ok(alignment)
    }

    fn abort(&mut self, sigil: &Sigil, error: &GraphError) {
        if !self.graph.store.is_transactional() {
            self.poison(sigil, &error.to_string());
            return;
        }
        match self.graph.store.rollback() {
            Ok(()) => {
                self.graph.mark_unranked();
                warn!(session_id = %self.id, witness = %sigil, error = %error, "Merge rolled back");
            }
            Err(e) => self.poison(sigil, &e.to_string()),
        }
    }

    fn poison(&mut self, sigil: &Sigil, reason: &str) {
        self.poisoned = true;
        warn!(
            session_id = %self.id,
            witness = %sigil,
            reason = reason,
            "Session poisoned, graph may hold a partial merge"
        );
    }

    /// Project the graph into an alignment table.
    pub fn to_table(&mut self) -> Result<AlignmentTable, CollationError> {
        if self.poisoned {
            return Err(CollationError::Poisoned);
        }
        Ok(self.graph.to_table()?)
    }

    /// Join the graph and project it into an apparatus.
    ///
    /// Joining is permanent and seals the session against further merges.
    pub fn to_apparatus(&mut self) -> Result<Apparatus, CollationError> {
        if self.poisoned {
            return Err(CollationError::Poisoned);
        }
        self.sealed = true;
        Ok(self.graph.to_apparatus()?)
    }

    /// Whether the graph has been joined.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Provenance record of the current state.
    pub fn summary(&self) -> CollationSummary {
        CollationSummary {
            session_id: self.id,
            schema_version: COLLATION_SCHEMA_VERSION.to_string(),
            config_hash: self.config.params_hash(),
            witnesses: self.merged.clone(),
            vertex_count: self.graph.vertex_count(),
            edge_count: self.graph.edge_count(),
            transposition_count: self.graph.transposition_count(),
            graph_fingerprint: self.graph.fingerprint(),
            collated_at: Utc::now(),
        }
    }
}

impl<S: VariantGraphStore> std::fmt::Debug for CollationSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollationSession")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("graph", &self.graph)
            .field("merged", &self.merged.len())
            .field("poisoned", &self.poisoned)
            .field("sealed", &self.sealed)
            .finish()
    }
}
