//! Ranking pass.
//!
//! `rank(start) = 0` and `rank(v) = 1 + max(rank(p))` over all predecessors
//! `p`. Vertices of equal rank are aligned positions; ranks drive both
//! aligners and every projection. Transpositions are ignored.

use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use crate::graph::{GraphError, VariantGraph};
use crate::store::VariantGraphStore;
use crate::types::VertexId;

impl<S: VariantGraphStore> VariantGraph<S> {
    /// Assign longest-path ranks to every vertex.
    ///
    /// A no-op when the graph is already ranked.
    pub fn rank(&mut self) -> Result<(), GraphError> {
        if self.ranked {
            return Ok(());
        }

        let ids = self.store.vertex_ids();
        let mut in_degree: BTreeMap<VertexId, usize> = ids
            .iter()
            .map(|id| (*id, self.store.incoming(*id).len()))
            .collect();
        let mut ranks: BTreeMap<VertexId, u32> = BTreeMap::new();
        let mut queue: VecDeque<VertexId> = in_degree
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(id, _)| *id)
            .collect();

        while let Some(v) = queue.pop_front() {
            let rank = *ranks.entry(v).or_insert(0);
            for edge_id in self.store.outgoing(v) {
                let Some(edge) = self.store.edge(edge_id) else {
                    continue;
                };
                let to = edge.to;
                let entry = ranks.entry(to).or_insert(0);
                *entry = (*entry).max(rank + 1);
                if let Some(n) = in_degree.get_mut(&to) {
                    *n -= 1;
                    if *n == 0 {
                        queue.push_back(to);
                    }
                }
            }
        }

        let unranked = in_degree.values().filter(|n| **n > 0).count();
        if unranked > 0 {
            return Err(GraphError::Cycle(unranked));
        }

        for (id, rank) in &ranks {
            let current = self.store.vertex(*id).map(|v| v.rank());
            if current != Some(*rank) {
                self.store.set_rank(*id, *rank).map_err(GraphError::from_store)?;
            }
        }

        self.ranked = true;
        debug!(
            vertices = ids.len(),
            max_rank = self.rank_of(self.end()).unwrap_or(0),
            "Ranked variant graph"
        );
        Ok(())
    }

    /// Highest rank, i.e. the rank of `end`.
    pub fn max_rank(&self) -> Result<u32, GraphError> {
        self.require_ranked()?;
        self.rank_of(self.end()).ok_or(GraphError::UnknownVertex(self.end()))
    }

    /// Non-sentinel vertices grouped by rank, ascending.
    pub fn vertices_by_rank(&self) -> Result<BTreeMap<u32, Vec<VertexId>>, GraphError> {
        self.require_ranked()?;
        let mut by_rank: BTreeMap<u32, Vec<VertexId>> = BTreeMap::new();
        for id in self.store.vertex_ids() {
            if self.is_sentinel(id) {
                continue;
            }
            if let Some(rank) = self.rank_of(id) {
                by_rank.entry(rank).or_default().push(id);
            }
        }
        Ok(by_rank)
    }
}
