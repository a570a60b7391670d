//! Pairwise dynamic-programming aligner.
//!
//! The graph is linearized by rank: row `r` (for `1 ≤ r < rank(end)`) holds
//! every vertex of rank `r`, and matches a token when any of them does. A
//! classic global alignment over the `(rows + 1) × (tokens + 1)` score
//! matrix then decides which tokens join which rows. No transpositions.
//!
//! Backtrace starts at the bottom-right cell and prefers, in order: a
//! diagonal match, skipping a graph row, skipping a witness token.

use tracing::debug;

use super::Alignment;
use crate::comparator::TokenComparator;
use crate::graph::{GraphError, VariantGraph};
use crate::store::VariantGraphStore;
use crate::types::{VertexId, Witness};

/// Default diagonal match score.
pub const DEFAULT_MATCH_SCORE: i64 = 1;

/// Default gap cost.
pub const DEFAULT_GAP_COST: i64 = 1;

/// Needleman–Wunsch aligner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeedlemanWunschAligner {
    match_score: i64,
    gap_cost: i64,
}

impl NeedlemanWunschAligner {
    /// Create an aligner with explicit scores.
    pub fn new(match_score: i64, gap_cost: i64) -> Self {
        Self { match_score, gap_cost }
    }

    /// Align `witness` against a ranked graph.
    pub fn align<S: VariantGraphStore>(
        &self,
        graph: &VariantGraph<S>,
        witness: &Witness,
        comparator: &dyn TokenComparator,
    ) -> Result<Alignment, GraphError> {
        let rows: Vec<Vec<VertexId>> = graph.vertices_by_rank()?.into_values().collect();
        let tokens = witness.tokens();
        let (n, m) = (rows.len(), tokens.len());

        // hit[i][j]: first vertex (by id) of row i matching token j.
        let hit: Vec<Vec<Option<VertexId>>> = rows
            .iter()
            .map(|row| {
                tokens
                    .iter()
                    .map(|t| {
                        row.iter().copied().find(|v| {
                            graph
                                .vertex(*v)
                                .is_some_and(|vx| vx.tokens().iter().any(|o| comparator.matches(t, o)))
                        })
                    })
                    .collect()
            })
            .collect();

        // Scores saturate, so out-of-range parameters degrade instead of wrapping.
        let gap = |k: usize| (k as i64).saturating_mul(self.gap_cost).saturating_neg();
        let mut score = vec![vec![0i64; m + 1]; n + 1];
        for (i, row) in score.iter_mut().enumerate() {
            row[0] = gap(i);
        }
        for j in 0..=m {
            score[0][j] = gap(j);
        }
        for i in 1..=n {
            for j in 1..=m {
                let skip_row = score[i - 1][j].saturating_sub(self.gap_cost);
                let skip_token = score[i][j - 1].saturating_sub(self.gap_cost);
                let mut best = skip_row.max(skip_token);
                if hit[i - 1][j - 1].is_some() {
                    best = best.max(score[i - 1][j - 1].saturating_add(self.match_score));
                }
                score[i][j] = best;
            }
        }

        let mut alignment = Alignment::default();
        let (mut i, mut j) = (n, m);
        while i > 0 || j > 0 {
            if i > 0 && j > 0 {
                if let Some(v) = hit[i - 1][j - 1] {
                    if score[i][j] == score[i - 1][j - 1].saturating_add(self.match_score) {
                        alignment.matches.insert(j - 1, v);
                        i -= 1;
                        j -= 1;
                        continue;
                    }
                }
            }
            if i > 0 && (j == 0 || score[i][j] == score[i - 1][j].saturating_sub(self.gap_cost)) {
                i -= 1;
            } else {
                j -= 1;
            }
        }

        debug!(
            witness = %witness.sigil(),
            rows = n,
            tokens = m,
            score = score[n][m],
            matched = alignment.matched(),
            "Needleman-Wunsch alignment"
        );
        Ok(alignment)
    }
}

impl Default for NeedlemanWunschAligner {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_SCORE, DEFAULT_GAP_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::merge;
    use crate::comparator::{EqualityComparator, NearMatchComparator};

    fn build(texts: &[(&str, &str)]) -> VariantGraph {
        let mut graph = VariantGraph::new();
        for (sigil, text) in texts {
            let w = Witness::from_words(*sigil, text.split_whitespace());
            graph.rank().unwrap();
            let alignment = NeedlemanWunschAligner::default()
                .align(&graph, &w, &EqualityComparator)
                .unwrap();
            merge(&mut graph, &w, &alignment).unwrap();
        }
        graph.rank().unwrap();
        graph
    }

    #[test]
    fn test_first_witness_matches_nothing() {
        let mut graph = VariantGraph::new();
        graph.rank().unwrap();
        let w = Witness::from_words("A", ["a", "b"]);
        let alignment = NeedlemanWunschAligner::default()
            .align(&graph, &w, &EqualityComparator)
            .unwrap();
        assert_eq!(alignment, Alignment::default());
    }

    #[test]
    fn test_gap_in_middle() {
        let graph = build(&[("A", "the black cat")]);
        let w = Witness::from_words("B", ["the", "cat"]);
        let alignment = NeedlemanWunschAligner::default()
            .align(&graph, &w, &EqualityComparator)
            .unwrap();

        let ranks: Vec<u32> = alignment
            .matches
            .values()
            .map(|v| graph.rank_of(*v).unwrap())
            .collect();
        assert_eq!(ranks, vec![1, 3]);
        assert!(alignment.transpositions.is_empty());
    }

    #[test]
    fn test_repeated_tokens_align_to_suffix() {
        let graph = build(&[("A", "a b a b a")]);
        let w = Witness::from_words("B", ["a", "b", "a"]);
        let alignment = NeedlemanWunschAligner::default()
            .align(&graph, &w, &EqualityComparator)
            .unwrap();

        // Backtrace from the bottom-right corner takes the diagonal first.
        let ranks: Vec<u32> = alignment
            .matches
            .values()
            .map(|v| graph.rank_of(*v).unwrap())
            .collect();
        assert_eq!(ranks, vec![3, 4, 5]);
    }

    #[test]
    fn test_extreme_scores_do_not_overflow() {
        let graph = build(&[("A", "x y")]);
        let w = Witness::from_words("B", ["x", "z", "y"]);
        for (match_score, gap_cost) in [(1, i64::MAX), (i64::MAX, 1), (i64::MIN, i64::MIN)] {
            let alignment = NeedlemanWunschAligner::new(match_score, gap_cost)
                .align(&graph, &w, &EqualityComparator)
                .unwrap();
            let ranks: Vec<u32> = alignment
                .matches
                .values()
                .map(|v| graph.rank_of(*v).unwrap())
                .collect();
            assert!(ranks.windows(2).all(|r| r[0] < r[1]), "{match_score} {gap_cost}");
        }
    }

    #[test]
    fn test_near_match_comparator() {
        let graph = build(&[("A", "colour of magic")]);
        let w = Witness::from_words("B", ["color", "of", "magick"]);
        let alignment = NeedlemanWunschAligner::default()
            .align(&graph, &w, &NearMatchComparator::default())
            .unwrap();
        assert_eq!(alignment.matched(), 3);
    }
}
