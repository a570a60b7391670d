//! # collation-kernel
//!
//! Deterministic variant-graph collation of textual witnesses.
//!
//! The kernel answers one question:
//!
//! > Given several versions of a text, which tokens **correspond**?
//!
//! ## Core Contract
//!
//! 1. Merge witnesses one by one into a shared variant graph
//! 2. Align each new witness against the graph built so far
//! 3. Project the graph into an alignment table or a critical apparatus
//!
//! ## Architecture
//!
//! ```text
//! Witness → Aligner (Islands | Needleman-Wunsch) → merge → VariantGraph
//!                ↓                                             ↓
//!         TokenComparator                         rank → table / join → apparatus
//!                                                              ↓
//!                                      VariantGraphStore (memory or journaled)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same witnesses + same config + same order → identical graph fingerprint
//! - Vertex and edge iteration follow creation order
//! - Alignment tie-breaks are total, never hash-order dependent

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod comparator;
pub mod store;
pub mod graph;
pub mod rank;
pub mod join;
pub mod align;
pub mod projection;
pub mod config;
pub mod session;
pub mod tokenizer;
pub mod canonical;
pub mod canonical_content;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    Sigil, Token, Witness, WitnessError, Vertex, VertexId, Edge, EdgeId,
    Transposition, TranspositionId, CollationLimits, LimitViolation,
};
pub use comparator::{
    TokenComparator, EqualityComparator, NearMatchComparator, ComparatorKind, levenshtein,
};
pub use store::{
    VariantGraphStore, InMemoryGraphStore, InMemoryError, JournaledGraphStore, JournalError,
};
pub use graph::{VariantGraph, GraphError};
pub use align::{
    AlignError, Alignment, AlgorithmKind, IslandAligner, NeedlemanWunschAligner, MergeOutcome, merge,
};
pub use projection::{AlignmentTable, TableRow, Apparatus, ApparatusEntry, EntryState};
pub use config::{CollationConfig, ConfigError};
pub use session::{
    CollationSession, CollationError, CollationSummary, WitnessReport, WitnessDigest,
};
pub use tokenizer::SimpleTokenizer;
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};
pub use canonical_content::{
    CANONICAL_CONTENT_VERSION, normalize_text, canonical_content, compute_content_hash,
    verify_content_hash,
};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState, ConfigRegistry, ConfigRef};

/// Schema version for all exported collation types.
/// Increment on breaking changes to any schema type.
pub const COLLATION_SCHEMA_VERSION: &str = "1.0.0";

/// Default config version identifier.
pub const DEFAULT_CONFIG_VERSION: &str = "collation_config_v1";
