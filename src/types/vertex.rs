//! Vertex types for the variant graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::token::{Sigil, Token};

/// Arena identifier of a vertex.
///
/// Issued by the graph store in increasing order; implements `Ord` so
/// id-keyed collections iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(u64);

impl VertexId {
    /// Create a vertex id from its raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw arena index.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// One aligned position in the variant graph.
///
/// While witnesses are being aligned a vertex holds at most one token per
/// witness. Joining contracts chains, after which a vertex may hold a
/// contiguous segment of several tokens of the same witness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    id: VertexId,
    tokens: BTreeSet<Token>,
    rank: u32,
}

impl Vertex {
    /// Create a vertex with the given tokens and rank 0.
    pub fn new(id: VertexId, tokens: BTreeSet<Token>) -> Self {
        Self { id, tokens, rank: 0 }
    }

    /// Vertex id.
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// All tokens, ordered by witness then ordinal.
    pub fn tokens(&self) -> &BTreeSet<Token> {
        &self.tokens
    }

    /// Tokens belonging to one witness, in reading order.
    pub fn tokens_of<'a>(&'a self, witness: &'a Sigil) -> impl Iterator<Item = &'a Token> + 'a {
        self.tokens.iter().filter(move |t| t.witness() == witness)
    }

    /// Whether this vertex holds a token of the given witness.
    pub fn has_witness(&self, witness: &Sigil) -> bool {
        self.tokens.iter().any(|t| t.witness() == witness)
    }

    /// Witnesses with tokens at this vertex.
    pub fn witnesses(&self) -> BTreeSet<Sigil> {
        self.tokens.iter().map(|t| t.witness().clone()).collect()
    }

    /// Whether this vertex holds no tokens (sentinels only).
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Longest-path rank from the start sentinel.
    ///
    /// Only meaningful after the ranking pass.
    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub(crate) fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }

    pub(crate) fn insert_tokens(&mut self, tokens: impl IntoIterator<Item = Token>) {
        self.tokens.extend(tokens);
    }

    pub(crate) fn replace_tokens(&mut self, tokens: BTreeSet<Token>) -> BTreeSet<Token> {
        std::mem::replace(&mut self.tokens, tokens)
    }

    /// Sorted `(sigil, ordinal)` keys, used for structural fingerprints.
    pub fn token_keys(&self) -> Vec<(String, usize)> {
        self.tokens
            .iter()
            .map(|t| (t.witness().as_str().to_string(), t.ordinal()))
            .collect()
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tokens.is_empty() {
            return write!(f, "{}[#]", self.id);
        }
        let tokens: Vec<String> = self.tokens.iter().map(|t| t.to_string()).collect();
        write!(f, "{}[{}]", self.id, tokens.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_of_filters_by_witness() {
        let tokens: BTreeSet<Token> = [
            Token::new(Sigil::from("A"), 0, "the", "the"),
            Token::new(Sigil::from("B"), 4, "the", "the"),
        ]
        .into_iter()
        .collect();
        let vertex = Vertex::new(VertexId::new(7), tokens);
        let b = Sigil::from("B");

        let of_b: Vec<_> = vertex.tokens_of(&b).collect();
        assert_eq!(of_b.len(), 1);
        assert_eq!(of_b[0].ordinal(), 4);
        assert!(vertex.has_witness(&Sigil::from("A")));
        assert!(!vertex.has_witness(&Sigil::from("C")));
    }

    #[test]
    fn test_sentinel_display() {
        let vertex = Vertex::new(VertexId::new(0), BTreeSet::new());
        assert_eq!(vertex.to_string(), "v0[#]");
        assert!(vertex.is_empty());
    }
}
