//! Critical-apparatus projection.
//!
//! The graph is joined and ranked, then each rank becomes one entry listing
//! every witness's reading at that position. Entries are classified by how
//! many distinct readings they contain:
//!
//! | Readings | Gaps | State |
//! |----------|------|-------|
//! | 1 | none | `Invariant` |
//! | 1 | some | `SemiInvariant` |
//! | > 1 | any | `Variant` |
//!
//! A reading is the raw content of the witness's tokens joined by spaces.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::graph::{GraphError, VariantGraph};
use crate::store::VariantGraphStore;
use crate::types::{tokens_to_string, Sigil, Token, VertexId};

/// Classification of an apparatus entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Every witness reads the same.
    Invariant,
    /// The witnesses that read here agree, some read nothing.
    SemiInvariant,
    /// Witnesses disagree.
    Variant,
}

/// One position of the apparatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApparatusEntry {
    /// Rank of the position.
    pub rank: u32,
    /// Vertices at this rank.
    pub vertices: Vec<VertexId>,
    /// Tokens per witness; empty means the witness has nothing here.
    pub tokens: BTreeMap<Sigil, Vec<Token>>,
}

impl ApparatusEntry {
    /// Whether `witness` has tokens at this position.
    pub fn covers(&self, witness: &Sigil) -> bool {
        self.tokens.get(witness).is_some_and(|t| !t.is_empty())
    }

    /// The reading of `witness`, if it covers this position.
    pub fn reading_of(&self, witness: &Sigil) -> Option<String> {
        self.tokens
            .get(witness)
            .filter(|t| !t.is_empty())
            .map(|t| tokens_to_string(t))
    }

    /// Whether some witness has nothing here.
    pub fn has_empty_cells(&self) -> bool {
        self.tokens.values().any(Vec::is_empty)
    }

    /// Distinct readings with the witnesses that attest each.
    pub fn readings(&self) -> BTreeMap<String, BTreeSet<Sigil>> {
        let mut readings: BTreeMap<String, BTreeSet<Sigil>> = BTreeMap::new();
        for witness in self.tokens.keys() {
            if let Some(reading) = self.reading_of(witness) {
                readings.entry(reading).or_default().insert(witness.clone());
            }
        }
        readings
    }

    /// Classify the entry.
    pub fn state(&self) -> EntryState {
        match (self.readings().len(), self.has_empty_cells()) {
            (n, _) if n > 1 => EntryState::Variant,
            (_, true) => EntryState::SemiInvariant,
            _ => EntryState::Invariant,
        }
    }
}

/// Critical apparatus over all witnesses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apparatus {
    /// Witnesses, ascending sigil.
    pub witnesses: Vec<Sigil>,
    /// Entries in rank order.
    pub entries: Vec<ApparatusEntry>,
}

impl Apparatus {
    /// Entries that record disagreement.
    pub fn variants(&self) -> impl Iterator<Item = &ApparatusEntry> {
        self.entries.iter().filter(|e| e.state() == EntryState::Variant)
    }
}

impl<S: VariantGraphStore> VariantGraph<S> {
    /// Join, rank and project the graph into an apparatus.
    pub fn to_apparatus(&mut self) -> Result<Apparatus, GraphError> {
        self.join()?;
        self.rank()?;
        let witnesses: Vec<Sigil> = self.witnesses().into_iter().collect();

        let mut entries = Vec::new();
        for (rank, vertices) in self.vertices_by_rank()? {
            let mut tokens: BTreeMap<Sigil, Vec<Token>> =
                witnesses.iter().map(|w| (w.clone(), Vec::new())).collect();
            for id in &vertices {
                if let Some(vertex) = self.vertex(*id) {
                    for token in vertex.tokens() {
                        tokens.entry(token.witness().clone()).or_default().push(token.clone());
                    }
                }
            }
            for cell in tokens.values_mut() {
                cell.sort();
            }
            entries.push(ApparatusEntry { rank, vertices, tokens });
        }

        Ok(Apparatus { witnesses, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{merge, AlgorithmKind};
    use crate::comparator::EqualityComparator;
    use crate::types::Witness;

    fn apparatus(texts: &[(&str, &str)]) -> Apparatus {
        let mut graph = VariantGraph::new();
        for (sigil, text) in texts {
            let w = Witness::from_words(*sigil, text.split_whitespace());
            graph.rank().unwrap();
            let alignment = AlgorithmKind::Islands
                .align(&graph, &w, &EqualityComparator)
                .unwrap();
            merge(&mut graph, &w, &alignment).unwrap();
        }
        graph.to_apparatus().unwrap()
    }

    #[test]
    fn test_classification() {
        let app = apparatus(&[("A", "the black cat"), ("B", "the white cat"), ("C", "the cat")]);
        let states: Vec<EntryState> = app.entries.iter().map(ApparatusEntry::state).collect();

        assert_eq!(
            states,
            vec![EntryState::Invariant, EntryState::Variant, EntryState::Invariant]
        );
        let variant = &app.entries[1];
        assert!(!variant.covers(&Sigil::from("C")));
        assert_eq!(variant.reading_of(&Sigil::from("B")).as_deref(), Some("white"));
        assert_eq!(variant.readings().len(), 2);
    }

    #[test]
    fn test_semi_invariant() {
        let app = apparatus(&[("A", "the black cat"), ("B", "the cat")]);
        let states: Vec<EntryState> = app.entries.iter().map(ApparatusEntry::state).collect();

        assert_eq!(
            states,
            vec![EntryState::Invariant, EntryState::SemiInvariant, EntryState::Invariant]
        );
        assert_eq!(app.variants().count(), 0);
    }

    #[test]
    fn test_joined_segments_form_one_reading() {
        let app = apparatus(&[("A", "in the beginning"), ("B", "in the beginning")]);

        assert_eq!(app.entries.len(), 1);
        assert_eq!(
            app.entries[0].reading_of(&Sigil::from("A")).as_deref(),
            Some("in the beginning")
        );
        assert_eq!(app.entries[0].state(), EntryState::Invariant);
    }
}
