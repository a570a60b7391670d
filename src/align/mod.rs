//! Witness alignment.
//!
//! An aligner compares one new witness against the ranked graph and returns
//! an [`Alignment`]: which tokens join which existing vertices, and which
//! unmatched tokens should be transposed with an existing vertex. The aligner
//! never mutates the graph; [`merge`] applies the plan.
//!
//! Every aligner guarantees that matched vertices have strictly increasing
//! rank in token order, which keeps the merged graph acyclic.

pub mod islands;
pub mod merge;
pub mod needleman_wunsch;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::comparator::TokenComparator;
use crate::graph::{GraphError, VariantGraph};
use crate::store::VariantGraphStore;
use crate::types::{CollationLimits, LimitViolation, VertexId, Witness};

pub use islands::IslandAligner;
pub use merge::{merge, MergeOutcome};
pub use needleman_wunsch::NeedlemanWunschAligner;

/// Alignment plan for one witness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    /// Token index → existing vertex the token joins.
    pub matches: BTreeMap<usize, VertexId>,
    /// Unmatched token index → existing vertex it is transposed with.
    pub transpositions: Vec<(usize, VertexId)>,
}

impl Alignment {
    /// Number of matched tokens.
    pub fn matched(&self) -> usize {
        self.matches.len()
    }
}

/// Error raised by a limit-checked alignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlignError {
    /// The graph could not be aligned against.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The witness needs more alignment work than the limits allow.
    #[error(transparent)]
    Limit(#[from] LimitViolation),
}

/// Largest accepted Needleman–Wunsch match score or gap cost.
pub const MAX_NW_SCORE: i64 = 1_000;

/// Serializable aligner choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlgorithmKind {
    /// Island and transposition detection.
    Islands,
    /// Pairwise dynamic programming against the rank-linearized graph.
    NeedlemanWunsch {
        /// Score of a diagonal match.
        match_score: i64,
        /// Cost of skipping a token or a graph row.
        gap_cost: i64,
    },
}

impl AlgorithmKind {
    /// Needleman–Wunsch with default scores.
    pub fn needleman_wunsch() -> Self {
        AlgorithmKind::NeedlemanWunsch {
            match_score: needleman_wunsch::DEFAULT_MATCH_SCORE,
            gap_cost: needleman_wunsch::DEFAULT_GAP_COST,
        }
    }

    /// Check that the scores are usable: both in `1..=MAX_NW_SCORE`.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            AlgorithmKind::Islands => Ok(()),
            AlgorithmKind::NeedlemanWunsch { match_score, gap_cost } => {
                for (name, value) in [("match_score", match_score), ("gap_cost", gap_cost)] {
                    if !(1..=MAX_NW_SCORE).contains(&value) {
                        return Err(format!("{name} {value} is outside 1..={MAX_NW_SCORE}"));
                    }
                }
                Ok(())
            }
        }
    }

    /// Align `witness` against `graph` under `limits`.
    pub fn align_within<S: VariantGraphStore>(
        &self,
        graph: &VariantGraph<S>,
        witness: &Witness,
        comparator: &dyn TokenComparator,
        limits: &CollationLimits,
    ) -> Result<Alignment, AlignError> {
        match *self {
            AlgorithmKind::Islands => IslandAligner.align_within(graph, witness, comparator, limits),
            AlgorithmKind::NeedlemanWunsch { .. } => Ok(self.align(graph, witness, comparator)?),
        }
    }

    /// Align `witness` against `graph`, which must be ranked.
    pub fn align<S: VariantGraphStore>(
        &self,
        graph: &VariantGraph<S>,
        witness: &Witness,
        comparator: &dyn TokenComparator,
    ) -> Result<Alignment, GraphError> {
        match *self {
            AlgorithmKind::Islands => IslandAligner.align(graph, witness, comparator),
            AlgorithmKind::NeedlemanWunsch { match_score, gap_cost } => {
                NeedlemanWunschAligner::new(match_score, gap_cost).align(graph, witness, comparator)
            }
        }
    }
}

impl Default for AlgorithmKind {
    fn default() -> Self {
        AlgorithmKind::Islands
    }
}

impl std::str::FromStr for AlgorithmKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "islands" => Ok(AlgorithmKind::Islands),
            "needleman-wunsch" | "needleman_wunsch" | "nw" => Ok(AlgorithmKind::needleman_wunsch()),
            other => Err(format!("unknown alignment algorithm '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds_scores() {
        assert!(AlgorithmKind::Islands.validate().is_ok());
        assert!(AlgorithmKind::needleman_wunsch().validate().is_ok());
        assert!(AlgorithmKind::NeedlemanWunsch { match_score: MAX_NW_SCORE, gap_cost: 1 }
            .validate()
            .is_ok());

        for (match_score, gap_cost) in [(1, i64::MAX), (0, 1), (1, -1), (i64::MIN, 1), (MAX_NW_SCORE + 1, 1)] {
            let kind = AlgorithmKind::NeedlemanWunsch { match_score, gap_cost };
            assert!(kind.validate().is_err(), "{kind:?}");
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Islands".parse::<AlgorithmKind>(), Ok(AlgorithmKind::Islands));
        assert_eq!("nw".parse::<AlgorithmKind>(), Ok(AlgorithmKind::needleman_wunsch()));
        assert!("magic".parse::<AlgorithmKind>().is_err());
    }
}
