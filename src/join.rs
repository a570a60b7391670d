//! Joining pass.
//!
//! Contracts chains of vertices that every witness traverses together, so a
//! run of agreeing tokens becomes one vertex holding a segment per witness.
//! `v` absorbs `w` when:
//!
//! - `v` is not `start` and has exactly one outgoing edge, to `w`
//! - `w` is not `end` and has exactly one incoming edge
//! - that edge's witnesses equal the union of `w`'s outgoing witnesses
//!
//! Passes repeat until nothing changes, so joining twice equals joining once.

use std::collections::BTreeSet;

use tracing::debug;

use crate::graph::{GraphError, VariantGraph};
use crate::store::VariantGraphStore;
use crate::types::{Sigil, VertexId};

impl<S: VariantGraphStore> VariantGraph<S> {
    /// Contract every joinable chain. Returns the number of absorbed vertices.
    pub fn join(&mut self) -> Result<usize, GraphError> {
        let mut joined = 0;
        loop {
            let mut changed = false;
            for v in self.topological_order(None) {
                if self.store.vertex(v).is_none() {
                    continue;
                }
                while let Some(w) = self.joinable_successor(v) {
                    self.absorb(v, w)?;
                    joined += 1;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        if joined > 0 {
            self.ranked = false;
            debug!(joined, vertices = self.vertex_count(), "Joined variant graph");
        }
        Ok(joined)
    }

    fn joinable_successor(&self, v: VertexId) -> Option<VertexId> {
        if v == self.start() || v == self.end() {
            return None;
        }
        let out = self.outgoing(v);
        let [edge] = out.as_slice() else {
            return None;
        };
        let w = edge.to;
        if w == self.end() || self.store.incoming(w).len() != 1 {
            return None;
        }
        let onward: BTreeSet<Sigil> = self
            .outgoing(w)
            .into_iter()
            .flat_map(|e| e.witnesses.iter().cloned())
            .collect();
        (edge.witnesses == onward).then_some(w)
    }

    fn absorb(&mut self, v: VertexId, w: VertexId) -> Result<(), GraphError> {
        let tokens = self
            .store
            .vertex(w)
            .map(|vertex| vertex.tokens().clone())
            .ok_or(GraphError::UnknownVertex(w))?;
        self.store.add_tokens(v, tokens).map_err(GraphError::from_store)?;

        for edge_id in self.store.incoming(w) {
            self.store.remove_edge(edge_id).map_err(GraphError::from_store)?;
        }
        for edge_id in self.store.outgoing(w) {
            let edge = self.store.remove_edge(edge_id).map_err(GraphError::from_store)?;
            self.store
                .create_edge(v, edge.to, edge.witnesses)
                .map_err(GraphError::from_store)?;
        }

        for t in self.store.transpositions_of(w) {
            let old = self.store.remove_transposition(t).map_err(GraphError::from_store)?;
            let mut vertices = old.vertices;
            vertices.remove(&w);
            vertices.insert(v);
            if vertices.len() >= 2 && self.find_transposition(&vertices).is_none() {
                self.store
                    .create_transposition(vertices)
                    .map_err(GraphError::from_store)?;
            }
        }

        self.store.remove_vertex(w).map_err(GraphError::from_store)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::align::AlgorithmKind;
    use crate::comparator::EqualityComparator;
    use crate::graph::VariantGraph;
    use crate::types::{tokens_to_string, Sigil, Witness};

    fn collate(texts: &[(&str, &str)]) -> (VariantGraph, Vec<Witness>) {
        let mut graph = VariantGraph::new();
        let witnesses: Vec<Witness> = texts
            .iter()
            .map(|(s, t)| Witness::from_words(*s, t.split_whitespace()))
            .collect();
        for w in &witnesses {
            graph.rank().unwrap();
            let alignment = AlgorithmKind::Islands
                .align(&graph, w, &EqualityComparator)
                .unwrap();
            crate::align::merge(&mut graph, w, &alignment).unwrap();
        }
        (graph, witnesses)
    }

    #[test]
    fn test_join_contracts_agreeing_runs() {
        let (mut graph, witnesses) =
            collate(&[("A", "the black cat sat"), ("B", "the white cat sat")]);
        graph.join().unwrap();
        graph.rank().unwrap();

        // the | black/white | cat sat
        assert_eq!(graph.vertex_count(), 2 + 4);
        let a = Sigil::from("A");
        let segments: Vec<String> = graph
            .vertices(None)
            .into_iter()
            .filter(|v| v.has_witness(&a))
            .map(|v| tokens_to_string(v.tokens_of(&a)))
            .collect();
        assert_eq!(segments, vec!["the", "black", "cat sat"]);
        assert!(graph.validate(&witnesses).is_ok());
    }

    #[test]
    fn test_join_is_idempotent() {
        let (mut graph, witnesses) = collate(&[("A", "a b c d"), ("B", "a x c d"), ("C", "a b c")]);
        graph.join().unwrap();
        let once = graph.fingerprint();
        assert_eq!(graph.join().unwrap(), 0);
        assert_eq!(graph.fingerprint(), once);
        assert!(graph.validate(&witnesses).is_ok());
    }

    #[test]
    fn test_single_witness_joins_to_one_vertex() {
        let (mut graph, witnesses) = collate(&[("A", "the first witness")]);
        assert_eq!(graph.join().unwrap(), 2);
        assert_eq!(graph.vertex_count(), 3);
        assert!(graph.validate(&witnesses).is_ok());
    }
}
