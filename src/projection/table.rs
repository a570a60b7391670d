//! Tabular projection: one row per rank, one column per witness.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::graph::{GraphError, VariantGraph};
use crate::store::VariantGraphStore;
use crate::types::{tokens_to_string, Sigil, Token};

/// One aligned position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Rank of the position in the graph.
    pub rank: u32,
    /// Tokens of every witness at this rank; empty means a gap.
    pub cells: BTreeMap<Sigil, Vec<Token>>,
}

impl TableRow {
    /// Tokens of `witness` at this row.
    pub fn cell(&self, witness: &Sigil) -> &[Token] {
        self.cells.get(witness).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any witness has a gap here.
    pub fn has_gap(&self) -> bool {
        self.cells.values().any(Vec::is_empty)
    }
}

/// Alignment table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentTable {
    /// Column order.
    pub witnesses: Vec<Sigil>,
    /// Rows in rank order.
    pub rows: Vec<TableRow>,
}

impl AlignmentTable {
    /// Read one witness's column top to bottom.
    pub fn column(&self, witness: &Sigil) -> Vec<&Token> {
        self.rows.iter().flat_map(|row| row.cell(witness)).collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for AlignmentTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for witness in &self.witnesses {
            let cells: Vec<String> = self
                .rows
                .iter()
                .map(|row| {
                    let cell = row.cell(witness);
                    if cell.is_empty() {
                        "-".to_string()
                    } else {
                        tokens_to_string(cell)
                    }
                })
                .collect();
            writeln!(f, "{witness}: | {} |", cells.join(" | "))?;
        }
        Ok(())
    }
}

impl<S: VariantGraphStore> VariantGraph<S> {
    /// Project the graph into an alignment table.
    ///
    /// Ranks the graph first. Ranks holding no tokens produce no row.
    pub fn to_table(&mut self) -> Result<AlignmentTable, GraphError> {
        self.rank()?;
        let witnesses: Vec<Sigil> = self.witnesses().into_iter().collect();

        let mut rows = Vec::new();
        for (rank, vertices) in self.vertices_by_rank()? {
            let mut cells: BTreeMap<Sigil, Vec<Token>> =
                witnesses.iter().map(|w| (w.clone(), Vec::new())).collect();
            for id in vertices {
                let Some(vertex) = self.vertex(id) else {
                    continue;
                };
                for token in vertex.tokens() {
                    cells.entry(token.witness().clone()).or_default().push(token.clone());
                }
            }
            if cells.values().all(Vec::is_empty) {
                continue;
            }
            for cell in cells.values_mut() {
                cell.sort();
            }
            rows.push(TableRow { rank, cells });
        }

        Ok(AlignmentTable { witnesses, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{merge, AlgorithmKind};
    use crate::comparator::EqualityComparator;
    use crate::types::Witness;

    fn table(texts: &[(&str, &str)]) -> AlignmentTable {
        let mut graph = VariantGraph::new();
        for (sigil, text) in texts {
            let w = Witness::from_words(*sigil, text.split_whitespace());
            graph.rank().unwrap();
            let alignment = AlgorithmKind::Islands
                .align(&graph, &w, &EqualityComparator)
                .unwrap();
            merge(&mut graph, &w, &alignment).unwrap();
        }
        graph.to_table().unwrap()
    }

    #[test]
    fn test_table_gaps() {
        let t = table(&[("A", "the black cat"), ("B", "the cat")]);
        let b = Sigil::from("B");

        assert_eq!(t.len(), 3);
        assert!(t.rows[1].cell(&b).is_empty());
        assert!(t.rows[1].has_gap());
        assert_eq!(tokens_to_string(t.column(&b)), "the cat");
    }

    #[test]
    fn test_table_display() {
        let t = table(&[("A", "a b"), ("B", "a c")]);
        assert_eq!(t.to_string(), "A: | a | b |\nB: | a | c |\n");
    }

    #[test]
    fn test_empty_graph_table() {
        let mut graph = VariantGraph::new();
        let t = graph.to_table().unwrap();
        assert!(t.is_empty());
        assert!(t.witnesses.is_empty());
    }
}
