//! Island aligner.
//!
//! ## Algorithm
//!
//! 1. Match table: for every token, the non-sentinel vertices holding a
//!    token the comparator accepts.
//! 2. Islands: maximal runs of matches `(i, v), (i+1, w), …` where each
//!    consecutive vertex pair is joined by a graph edge.
//! 3. Greedy selection: the best remaining island is taken first. Every
//!    match in it must be order-consistent with everything accepted so far
//!    (token index and rank both strictly increasing). An island with
//!    conflicting matches is split into its consistent runs, which go back
//!    into the pool.
//! 4. Transpositions: an unmatched token whose candidate vertex is unused
//!    and crosses the accepted order is transposed with that vertex. A
//!    candidate at the same rank as an accepted neighbour is a parallel
//!    reading, not a crossing, and the token gets a vertex of its own.
//!
//! "Best" is: more matches, then locality (distance between the island's
//! first rank and the rank expected from the nearest preceding accepted
//! match), then lower token index, rank and vertex id.
//!
//! ## Cost
//!
//! Island chaining follows outgoing edges, so it is linear in the number of
//! candidate matches times the vertex out-degree. Selection keeps the pool in
//! a heap and re-keys only the islands whose locality an acceptance changes.
//! [`IslandAligner::align_within`] refuses witnesses whose match table
//! exceeds `max_alignment_matches` before any island is built.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::ops::Bound;

use tracing::debug;

use super::{AlignError, Alignment};
use crate::comparator::TokenComparator;
use crate::graph::{GraphError, VariantGraph};
use crate::store::VariantGraphStore;
use crate::types::{CollationLimits, VertexId, Witness};

/// One candidate pairing: token index, vertex, vertex rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Match {
    token: usize,
    vertex: VertexId,
    rank: u32,
}

type Island = Vec<Match>;

/// Selection order, smallest first.
type IslandKey = (Reverse<usize>, i64, usize, u32, VertexId);

/// Accepted matches keyed by token index.
#[derive(Debug, Default)]
struct Accepted {
    by_token: BTreeMap<usize, Match>,
    vertices: BTreeSet<VertexId>,
}

impl Accepted {
    /// Rank expected at `token` given the nearest preceding accepted match.
    ///
    /// Before any match the virtual predecessor is `start`: token -1, rank 0.
    fn expected_rank(&self, token: usize) -> i64 {
        match self.by_token.range(..token).next_back() {
            Some((t, m)) => i64::from(m.rank) + (token - t) as i64,
            None => token as i64 + 1,
        }
    }

    fn locality(&self, m: &Match) -> i64 {
        (i64::from(m.rank) - self.expected_rank(m.token)).abs()
    }

    fn neighbours(&self, m: &Match) -> (Option<&Match>, Option<&Match>) {
        (
            self.by_token.range(..m.token).next_back().map(|(_, p)| p),
            self.by_token.range(m.token + 1..).next().map(|(_, s)| s),
        )
    }

    /// Whether `m` keeps token order and rank order in step.
    fn in_order(&self, m: &Match) -> bool {
        let (before, after) = self.neighbours(m);
        before.map_or(true, |p| p.rank < m.rank) && after.map_or(true, |s| s.rank > m.rank)
    }

    /// Whether `m` lies on the wrong side of an accepted neighbour.
    fn crosses(&self, m: &Match) -> bool {
        let (before, after) = self.neighbours(m);
        before.is_some_and(|p| p.rank > m.rank) || after.is_some_and(|s| s.rank < m.rank)
    }

    fn consistent(&self, m: &Match) -> bool {
        !self.by_token.contains_key(&m.token) && !self.vertices.contains(&m.vertex) && self.in_order(m)
    }

    fn accept(&mut self, m: Match) {
        self.vertices.insert(m.vertex);
        self.by_token.insert(m.token, m);
    }

    fn key(&self, island: &[Match]) -> Option<IslandKey> {
        let first = island.first()?;
        Some((
            Reverse(island.len()),
            self.locality(first),
            first.token,
            first.rank,
            first.vertex,
        ))
    }
}

/// Islands awaiting selection.
///
/// Heap entries carry the generation of their slot; re-keying bumps the
/// generation and leaves the old entry to be skipped on pop. The heap is
/// rebuilt once stale entries outnumber live islands.
#[derive(Debug, Default)]
struct Pool {
    islands: Vec<Option<Island>>,
    generations: Vec<u64>,
    by_first: BTreeMap<usize, BTreeSet<usize>>,
    heap: BinaryHeap<Reverse<(IslandKey, usize, u64)>>,
    live: usize,
}

impl Pool {
    fn push(&mut self, island: Island, accepted: &Accepted) {
        let Some(first) = island.first() else {
            return;
        };
        let slot = self.islands.len();
        self.by_first.entry(first.token).or_default().insert(slot);
        self.islands.push(Some(island));
        self.generations.push(0);
        self.live += 1;
        self.enqueue(slot, accepted);
    }

    fn enqueue(&mut self, slot: usize, accepted: &Accepted) {
        let key = self
            .islands
            .get(slot)
            .and_then(Option::as_ref)
            .and_then(|island| accepted.key(island));
        if let Some(key) = key {
            self.heap.push(Reverse((key, slot, self.generations[slot])));
        }
    }

    fn pop(&mut self) -> Option<Island> {
        while let Some(Reverse((_, slot, generation))) = self.heap.pop() {
            if self.generations[slot] != generation {
                continue;
            }
            let Some(island) = self.islands[slot].take() else {
                continue;
            };
            self.live -= 1;
            if let Some(first) = island.first() {
                if let Some(slots) = self.by_first.get_mut(&first.token) {
                    slots.remove(&slot);
                    if slots.is_empty() {
                        self.by_first.remove(&first.token);
                    }
                }
            }
            return Some(island);
        }
        None
    }

    /// Re-key every island whose first token lies in `tokens`.
    fn rekey(&mut self, tokens: (Bound<usize>, Bound<usize>), accepted: &Accepted) {
        let slots: Vec<usize> = self
            .by_first
            .range(tokens)
            .flat_map(|(_, slots)| slots.iter().copied())
            .collect();
        for slot in slots {
            self.generations[slot] += 1;
            self.enqueue(slot, accepted);
        }
        if self.heap.len() > 2 * self.live + 64 {
            self.compact(accepted);
        }
    }

    fn compact(&mut self, accepted: &Accepted) {
        self.heap.clear();
        let slots: Vec<usize> = self.by_first.values().flatten().copied().collect();
        for slot in slots {
            self.enqueue(slot, accepted);
        }
    }
}

/// Island and transposition aligner.
#[derive(Debug, Clone, Copy, Default)]
pub struct IslandAligner;

impl IslandAligner {
    /// Align `witness` against a ranked graph.
    pub fn align<S: VariantGraphStore>(
        &self,
        graph: &VariantGraph<S>,
        witness: &Witness,
        comparator: &dyn TokenComparator,
    ) -> Result<Alignment, GraphError> {
        graph.require_ranked()?;
        let candidates = match_table(graph, witness, comparator);
        Ok(select(graph, witness, &candidates))
    }

    /// Align `witness`, refusing match tables larger than the limits allow.
    pub fn align_within<S: VariantGraphStore>(
        &self,
        graph: &VariantGraph<S>,
        witness: &Witness,
        comparator: &dyn TokenComparator,
        limits: &CollationLimits,
    ) -> Result<Alignment, AlignError> {
        graph.require_ranked()?;
        let candidates = match_table(graph, witness, comparator);
        let matches = candidates.iter().map(Vec::len).sum();
        limits.check_alignment_matches(witness.sigil(), matches)?;
        Ok(select(graph, witness, &candidates))
    }
}

fn select<S: VariantGraphStore>(
    graph: &VariantGraph<S>,
    witness: &Witness,
    candidates: &[Vec<Match>],
) -> Alignment {
    let islands = find_islands(graph, candidates);
    let island_count = islands.len();

    let mut accepted = Accepted::default();
    let mut pool = Pool::default();
    for island in islands {
        pool.push(island, &accepted);
    }

    let mut splits = 0usize;
    while let Some(island) = pool.pop() {
        if island.iter().all(|m| accepted.consistent(m)) {
            let (Some(first), Some(last)) = (island.first().copied(), island.last().copied()) else {
                continue;
            };
            for m in island {
                accepted.accept(m);
            }
            // Tokens whose nearest accepted predecessor just changed.
            let next = accepted.by_token.range(last.token + 1..).next().map(|(t, _)| *t);
            pool.rekey(
                (Bound::Excluded(first.token), next.map_or(Bound::Unbounded, Bound::Included)),
                &accepted,
            );
            continue;
        }
        splits += 1;
        let mut run: Island = Vec::new();
        for m in island {
            if accepted.consistent(&m) {
                run.push(m);
            } else if !run.is_empty() {
                pool.push(std::mem::take(&mut run), &accepted);
            }
        }
        if !run.is_empty() {
            pool.push(run, &accepted);
        }
    }

    let mut transposed: BTreeSet<VertexId> = BTreeSet::new();
    let mut transpositions = Vec::new();
    for (token, options) in candidates.iter().enumerate() {
        if accepted.by_token.contains_key(&token) {
            continue;
        }
        let nearest = options
            .iter()
            .filter(|m| !accepted.vertices.contains(&m.vertex) && !transposed.contains(&m.vertex))
            .filter(|m| accepted.crosses(m))
            .min_by_key(|m| (accepted.locality(m), m.vertex));
        if let Some(m) = nearest {
            transposed.insert(m.vertex);
            transpositions.push((token, m.vertex));
        }
    }

    debug!(
        witness = %witness.sigil(),
        tokens = witness.len(),
        candidates = candidates.iter().map(Vec::len).sum::<usize>(),
        islands = island_count,
        splits,
        matched = accepted.by_token.len(),
        transposed = transpositions.len(),
        "Island alignment"
    );

    Alignment {
        matches: accepted.by_token.iter().map(|(t, m)| (*t, m.vertex)).collect(),
        transpositions,
    }
}

/// Candidate vertices per token, ascending vertex id.
fn match_table<S: VariantGraphStore>(
    graph: &VariantGraph<S>,
    witness: &Witness,
    comparator: &dyn TokenComparator,
) -> Vec<Vec<Match>> {
    let vertices: Vec<_> = graph
        .store()
        .vertex_ids()
        .into_iter()
        .filter(|id| !graph.is_sentinel(*id))
        .filter_map(|id| graph.vertex(id))
        .collect();

    witness
        .tokens()
        .iter()
        .enumerate()
        .map(|(token, t)| {
            vertices
                .iter()
                .filter(|v| v.tokens().iter().any(|other| comparator.matches(t, other)))
                .map(|v| Match {
                    token,
                    vertex: v.id(),
                    rank: v.rank(),
                })
                .collect()
        })
        .collect()
}

/// Chain matches into islands.
///
/// Each match continues to the lowest-id match of the next token that it
/// has an edge to and that no other match continues to yet, so every match
/// belongs to exactly one island.
fn find_islands<S: VariantGraphStore>(graph: &VariantGraph<S>, candidates: &[Vec<Match>]) -> Vec<Island> {
    let mut successors: BTreeMap<VertexId, Vec<VertexId>> = BTreeMap::new();
    let mut next: BTreeMap<Match, Match> = BTreeMap::new();
    let mut has_pred: BTreeSet<Match> = BTreeSet::new();

    for (token, options) in candidates.iter().enumerate() {
        let Some(following) = candidates.get(token + 1) else {
            break;
        };
        let by_vertex: BTreeMap<VertexId, Match> = following.iter().map(|n| (n.vertex, *n)).collect();
        for m in options {
            let targets = successors
                .entry(m.vertex)
                .or_insert_with(|| graph.outgoing(m.vertex).iter().map(|e| e.to).collect());
            let successor = targets
                .iter()
                .filter_map(|to| by_vertex.get(to))
                .filter(|n| !has_pred.contains(*n))
                .min_by_key(|n| n.vertex)
                .copied();
            if let Some(n) = successor {
                has_pred.insert(n);
                next.insert(*m, n);
            }
        }
    }

    let mut islands = Vec::new();
    for m in candidates.iter().flatten() {
        if has_pred.contains(m) {
            continue;
        }
        let mut island = vec![*m];
        let mut cursor = *m;
        while let Some(n) = next.get(&cursor) {
            island.push(*n);
            cursor = *n;
        }
        islands.push(island);
    }
    islands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::merge;
    use crate::comparator::EqualityComparator;
    use crate::types::LimitViolation;

    fn build(texts: &[(&str, &str)]) -> VariantGraph {
        let mut graph = VariantGraph::new();
        for (sigil, text) in texts {
            let w = Witness::from_words(*sigil, text.split_whitespace());
            graph.rank().unwrap();
            let alignment = IslandAligner.align(&graph, &w, &EqualityComparator).unwrap();
            merge(&mut graph, &w, &alignment).unwrap();
        }
        graph.rank().unwrap();
        graph
    }

    fn text_of(graph: &VariantGraph, v: VertexId) -> String {
        graph.vertex(v).unwrap().tokens().iter().next().unwrap().content().to_string()
    }

    #[test]
    fn test_requires_ranked_graph() {
        let graph = VariantGraph::new();
        let w = Witness::from_words("A", ["a"]);
        assert_eq!(
            IslandAligner.align(&graph, &w, &EqualityComparator),
            Err(GraphError::NotRanked)
        );
    }

    #[test]
    fn test_identical_witness_matches_everything() {
        let graph = build(&[("A", "the black cat")]);
        let w = Witness::from_words("B", ["the", "black", "cat"]);
        let alignment = IslandAligner.align(&graph, &w, &EqualityComparator).unwrap();

        assert_eq!(alignment.matched(), 3);
        assert!(alignment.transpositions.is_empty());
        let ranks: Vec<u32> = alignment
            .matches
            .values()
            .map(|v| graph.rank_of(*v).unwrap())
            .collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_repeated_tokens_prefer_local_island() {
        let graph = build(&[("A", "a b a b a")]);
        let w = Witness::from_words("B", ["a", "b", "a"]);
        let alignment = IslandAligner.align(&graph, &w, &EqualityComparator).unwrap();

        let ranks: Vec<u32> = alignment
            .matches
            .values()
            .map(|v| graph.rank_of(*v).unwrap())
            .collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_larger_island_wins() {
        let graph = build(&[("A", "x y z p q r s")]);
        let w = Witness::from_words("B", ["q", "r", "s", "x", "y"]);
        let alignment = IslandAligner.align(&graph, &w, &EqualityComparator).unwrap();

        // q r s wins over x y; x and y cross it and are transposed.
        let matched: Vec<String> = alignment.matches.values().map(|v| text_of(&graph, *v)).collect();
        assert_eq!(matched, vec!["q", "r", "s"]);
        let transposed: Vec<(usize, String)> = alignment
            .transpositions
            .iter()
            .map(|(t, v)| (*t, text_of(&graph, *v)))
            .collect();
        assert_eq!(transposed, vec![(3, "x".to_string()), (4, "y".to_string())]);
    }

    #[test]
    fn test_reversed_witness_transposes() {
        let graph = build(&[("A", "a b c")]);
        let w = Witness::from_words("B", ["c", "b", "a"]);
        let alignment = IslandAligner.align(&graph, &w, &EqualityComparator).unwrap();

        assert_eq!(alignment.matched(), 1);
        assert_eq!(text_of(&graph, alignment.matches[&1]), "b");
        assert_eq!(alignment.transpositions.len(), 2);
    }

    #[test]
    fn test_parallel_reading_is_not_transposed() {
        let graph = build(&[("A", "a b d"), ("B", "a c d")]);
        let w = Witness::from_words("C", ["a", "b", "c", "d"]);
        let alignment = IslandAligner.align(&graph, &w, &EqualityComparator).unwrap();

        // B's "c" shares rank 2 with "b"; it sits beside the accepted order.
        let matched: Vec<String> = alignment.matches.values().map(|v| text_of(&graph, *v)).collect();
        assert_eq!(matched, vec!["a", "b", "d"]);
        assert!(alignment.transpositions.is_empty());
    }

    #[test]
    fn test_match_limit_checked_before_search() {
        let graph = build(&[("A", "a a a a")]);
        let w = Witness::from_words("B", ["a", "a", "a", "a"]);
        let limits = CollationLimits::default().with_max_matches(15);

        let err = IslandAligner
            .align_within(&graph, &w, &EqualityComparator, &limits)
            .unwrap_err();
        assert_eq!(
            err,
            AlignError::Limit(LimitViolation::TooManyMatches {
                sigil: w.sigil().clone(),
                matches: 16,
                limit: 15,
            })
        );

        let alignment = IslandAligner
            .align_within(&graph, &w, &EqualityComparator, &limits.with_max_matches(16))
            .unwrap();
        assert_eq!(alignment.matched(), 4);
    }

    #[test]
    fn test_repeated_single_token_takes_the_diagonal() {
        let words = vec!["a"; 120];
        let graph = build(&[("A", words.join(" ").as_str())]);
        let w = Witness::from_words("B", words);
        let alignment = IslandAligner.align(&graph, &w, &EqualityComparator).unwrap();

        let ranks: Vec<u32> = alignment
            .matches
            .values()
            .map(|v| graph.rank_of(*v).unwrap())
            .collect();
        assert_eq!(ranks, (1..=120).collect::<Vec<u32>>());
        assert!(alignment.transpositions.is_empty());
    }

    #[test]
    fn test_selection_is_deterministic() {
        let graph = build(&[("A", "a a b a b"), ("B", "b a a b")]);
        let w = Witness::from_words("C", ["a", "b", "a", "a"]);
        let first = IslandAligner.align(&graph, &w, &EqualityComparator).unwrap();
        for _ in 0..5 {
            assert_eq!(IslandAligner.align(&graph, &w, &EqualityComparator).unwrap(), first);
        }
    }
}
