//! Apply an alignment plan to the graph.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use super::Alignment;
use crate::graph::{GraphError, VariantGraph};
use crate::store::VariantGraphStore;
use crate::types::{VertexId, Witness};

/// Counts from one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Tokens that joined an existing vertex.
    pub matched: usize,
    /// Tokens that got a new vertex.
    pub added: usize,
    /// Transpositions linked.
    pub transposed: usize,
}

/// Merge `witness` into `graph` following `alignment`.
///
/// Matched tokens join their vertex, the rest get new vertices, and the
/// witness's path is threaded from `start` through every token to `end`. An
/// empty witness only extends the `start`→`end` edge.
pub fn merge<S: VariantGraphStore>(
    graph: &mut VariantGraph<S>,
    witness: &Witness,
    alignment: &Alignment,
) -> Result<MergeOutcome, GraphError> {
    let sigils = BTreeSet::from([witness.sigil().clone()]);
    let mut outcome = MergeOutcome::default();
    let mut placed: BTreeMap<usize, VertexId> = BTreeMap::new();

    let mut previous = graph.start();
    for (index, token) in witness.tokens().iter().enumerate() {
        let current = match alignment.matches.get(&index) {
            Some(&vertex) => {
                graph.merge_token(vertex, token.clone())?;
                outcome.matched += 1;
                vertex
            }
            None => {
                outcome.added += 1;
                graph.add(token.clone())?
            }
        };
        graph.connect(previous, current, &sigils)?;
        placed.insert(index, current);
        previous = current;
    }
    graph.connect(previous, graph.end(), &sigils)?;

    for (index, existing) in &alignment.transpositions {
        let Some(&own) = placed.get(index) else {
            continue;
        };
        if own == *existing {
            continue;
        }
        graph.transpose([own, *existing])?;
        outcome.transposed += 1;
    }

    trace!(
        witness = %witness.sigil(),
        matched = outcome.matched,
        added = outcome.added,
        transposed = outcome.transposed,
        "Merged witness"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sigil;

    #[test]
    fn test_merge_first_witness() {
        let mut graph = VariantGraph::new();
        let w = Witness::from_words("A", ["the", "first", "witness"]);
        let outcome = merge(&mut graph, &w, &Alignment::default()).unwrap();

        assert_eq!(outcome, MergeOutcome { matched: 0, added: 3, transposed: 0 });
        assert_eq!(graph.vertex_count(), 5);
        assert!(graph.edge_between(graph.start(), graph.end()).is_none());
        assert!(graph.validate(&[w]).is_ok());
    }

    #[test]
    fn test_merge_empty_witness_uses_placeholder() {
        let mut graph = VariantGraph::new();
        let w = Witness::from_words("A", Vec::<String>::new());
        merge(&mut graph, &w, &Alignment::default()).unwrap();

        let edge = graph.edge_between(graph.start(), graph.end()).unwrap();
        assert_eq!(edge.witnesses, BTreeSet::from([Sigil::from("A")]));
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.validate(&[w]).is_ok());
    }
}
