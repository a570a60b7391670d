//! Input-size guards for a collation run.
//!
//! Both aligners do work proportional to `vertices × tokens` for every merged
//! witness, and island search also grows with the number of candidate
//! matches. These limits are checked before any mutation for a witness, so an
//! oversized input aborts cleanly with the previously merged witnesses intact.

use serde::{Deserialize, Serialize};

use super::token::Sigil;

/// Budget caps for one collation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollationLimits {
    /// Maximum number of witnesses merged into one graph.
    pub max_witnesses: usize,
    /// Maximum number of tokens in a single witness.
    pub max_tokens_per_witness: usize,
    /// Maximum `graph vertices × witness tokens` for one alignment step.
    pub max_alignment_cells: usize,
    /// Maximum candidate `(token, vertex)` matches island search may consider.
    #[serde(default = "default_max_alignment_matches")]
    pub max_alignment_matches: usize,
}

const DEFAULT_MAX_ALIGNMENT_MATCHES: usize = 1_000_000;

fn default_max_alignment_matches() -> usize {
    DEFAULT_MAX_ALIGNMENT_MATCHES
}

impl CollationLimits {
    /// Create custom limits with the default match cap.
    pub fn new(max_witnesses: usize, max_tokens_per_witness: usize, max_alignment_cells: usize) -> Self {
        Self {
            max_witnesses,
            max_tokens_per_witness,
            max_alignment_cells,
            max_alignment_matches: DEFAULT_MAX_ALIGNMENT_MATCHES,
        }
    }

    /// Replace the match cap.
    pub fn with_max_matches(mut self, max_alignment_matches: usize) -> Self {
        self.max_alignment_matches = max_alignment_matches;
        self
    }

    /// Limits that never trigger.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX, usize::MAX, usize::MAX).with_max_matches(usize::MAX)
    }

    /// Field-wise minimum of `self` and `ceiling`.
    pub fn clamped_to(&self, ceiling: &CollationLimits) -> Self {
        Self {
            max_witnesses: self.max_witnesses.min(ceiling.max_witnesses),
            max_tokens_per_witness: self.max_tokens_per_witness.min(ceiling.max_tokens_per_witness),
            max_alignment_cells: self.max_alignment_cells.min(ceiling.max_alignment_cells),
            max_alignment_matches: self.max_alignment_matches.min(ceiling.max_alignment_matches),
        }
    }

    /// Check the total witness count of a run.
    pub fn check_witness_count(&self, count: usize) -> Result<(), LimitViolation> {
        if count > self.max_witnesses {
            return Err(LimitViolation::TooManyWitnesses {
                count,
                limit: self.max_witnesses,
            });
        }
        Ok(())
    }

    /// Check the token count of a single witness.
    pub fn check_witness_length(&self, sigil: &Sigil, tokens: usize) -> Result<(), LimitViolation> {
        if tokens > self.max_tokens_per_witness {
            return Err(LimitViolation::WitnessTooLong {
                sigil: sigil.clone(),
                tokens,
                limit: self.max_tokens_per_witness,
            });
        }
        Ok(())
    }

    /// Check the alignment work for merging `tokens` tokens into a graph of
    /// `vertices` vertices.
    pub fn check_alignment_cells(
        &self,
        sigil: &Sigil,
        vertices: usize,
        tokens: usize,
    ) -> Result<(), LimitViolation> {
        let cells = vertices.saturating_mul(tokens);
        if cells > self.max_alignment_cells {
            return Err(LimitViolation::AlignmentTooLarge {
                sigil: sigil.clone(),
                cells,
                limit: self.max_alignment_cells,
            });
        }
        Ok(())
    }

    /// Check the number of candidate matches found for a witness.
    pub fn check_alignment_matches(&self, sigil: &Sigil, matches: usize) -> Result<(), LimitViolation> {
        if matches > self.max_alignment_matches {
            return Err(LimitViolation::TooManyMatches {
                sigil: sigil.clone(),
                matches,
                limit: self.max_alignment_matches,
            });
        }
        Ok(())
    }
}

impl Default for CollationLimits {
    fn default() -> Self {
        Self {
            max_witnesses: 256,
            max_tokens_per_witness: 20_000,
            max_alignment_cells: 50_000_000,
            max_alignment_matches: DEFAULT_MAX_ALIGNMENT_MATCHES,
        }
    }
}

/// A resource limit that a collation input exceeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LimitViolation {
    /// Too many witnesses in one run.
    #[error("{count} witnesses exceed the limit of {limit}")]
    TooManyWitnesses {
        /// Witness count requested.
        count: usize,
        /// Configured limit.
        limit: usize,
    },
    /// One witness has too many tokens.
    #[error("witness '{sigil}' has {tokens} tokens, limit is {limit}")]
    WitnessTooLong {
        /// Offending witness.
        sigil: Sigil,
        /// Token count.
        tokens: usize,
        /// Configured limit.
        limit: usize,
    },
    /// The alignment step for a witness would exceed the cell budget.
    #[error("aligning witness '{sigil}' needs {cells} cells, limit is {limit}")]
    AlignmentTooLarge {
        /// Offending witness.
        sigil: Sigil,
        /// Cells required.
        cells: usize,
        /// Configured limit.
        limit: usize,
    },
    /// Island search for a witness would consider too many candidate matches.
    #[error("witness '{sigil}' has {matches} candidate matches, limit is {limit}")]
    TooManyMatches {
        /// Offending witness.
        sigil: Sigil,
        /// Candidate matches found.
        matches: usize,
        /// Configured limit.
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_witness_count_limit() {
        let limits = CollationLimits::new(2, 10, 100);
        assert!(limits.check_witness_count(2).is_ok());
        assert_eq!(
            limits.check_witness_count(3),
            Err(LimitViolation::TooManyWitnesses { count: 3, limit: 2 })
        );
    }

    #[test]
    fn test_alignment_cells_saturate() {
        let limits = CollationLimits::default();
        let err = limits
            .check_alignment_cells(&Sigil::from("A"), usize::MAX, 2)
            .unwrap_err();
        assert!(matches!(err, LimitViolation::AlignmentTooLarge { cells: usize::MAX, .. }));
    }

    #[test]
    fn test_unbounded_never_triggers() {
        let limits = CollationLimits::unbounded();
        assert!(limits.check_witness_length(&Sigil::from("A"), 1 << 40).is_ok());
        assert!(limits.check_alignment_matches(&Sigil::from("A"), 1 << 40).is_ok());
    }

    #[test]
    fn test_match_limit() {
        let limits = CollationLimits::default().with_max_matches(4);
        assert!(limits.check_alignment_matches(&Sigil::from("A"), 4).is_ok());
        assert_eq!(
            limits.check_alignment_matches(&Sigil::from("A"), 5),
            Err(LimitViolation::TooManyMatches { sigil: Sigil::from("A"), matches: 5, limit: 4 })
        );
    }

    #[test]
    fn test_clamped_to_takes_fieldwise_minimum() {
        let ceiling = CollationLimits::new(10, 100, 1000).with_max_matches(50);
        let raised = CollationLimits::unbounded();
        assert_eq!(raised.clamped_to(&ceiling), ceiling);

        let lowered = CollationLimits::new(2, 500, 10).with_max_matches(500);
        assert_eq!(
            lowered.clamped_to(&ceiling),
            CollationLimits::new(2, 100, 10).with_max_matches(50)
        );
    }

    #[test]
    fn test_missing_match_limit_deserializes_to_default() {
        let json = r#"{"max_witnesses":3,"max_tokens_per_witness":4,"max_alignment_cells":5}"#;
        let limits: CollationLimits = serde_json::from_str(json).unwrap();
        assert_eq!(limits, CollationLimits::new(3, 4, 5));
    }
}
