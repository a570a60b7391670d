//! Token and sigil types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a witness within one collation.
///
/// Sigils order lexically, which gives every witness-keyed map in the
/// crate a deterministic iteration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sigil(String);

impl Sigil {
    /// Create a sigil from any string-like value.
    pub fn new(sigil: impl Into<String>) -> Self {
        Self(sigil.into())
    }

    /// Get the sigil as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sigil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Sigil {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Sigil {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One unit of a witness's content.
///
/// A token is identified by its witness and ordinal; content and normalized
/// form are payload. Ordering is `(witness, ordinal)`, so a sorted set of
/// tokens lists each witness's tokens in reading order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    witness: Sigil,
    ordinal: usize,
    content: String,
    normalized: String,
}

impl Token {
    /// Create a new token.
    pub fn new(
        witness: Sigil,
        ordinal: usize,
        content: impl Into<String>,
        normalized: impl Into<String>,
    ) -> Self {
        Self {
            witness,
            ordinal,
            content: content.into(),
            normalized: normalized.into(),
        }
    }

    /// Sigil of the witness this token belongs to.
    pub fn witness(&self) -> &Sigil {
        &self.witness
    }

    /// Position of this token within its witness (0-based).
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Raw content as transcribed.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Normalized form used for comparison.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Identity key `(witness, ordinal)`.
    pub fn key(&self) -> (&Sigil, usize) {
        (&self.witness, self.ordinal)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Token {}

impl std::hash::Hash for Token {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.witness.hash(state);
        self.ordinal.hash(state);
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:'{}'", self.witness, self.ordinal, self.content)
    }
}

/// Join the raw content of tokens with single spaces.
pub fn tokens_to_string<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> String {
    tokens
        .into_iter()
        .map(Token::content)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_ordering_by_witness_then_ordinal() {
        let a0 = Token::new(Sigil::from("A"), 0, "the", "the");
        let a1 = Token::new(Sigil::from("A"), 1, "cat", "cat");
        let b0 = Token::new(Sigil::from("B"), 0, "a", "a");

        assert!(a0 < a1);
        assert!(a1 < b0);
    }

    #[test]
    fn test_token_identity_ignores_content() {
        let t1 = Token::new(Sigil::from("A"), 3, "Cat", "cat");
        let t2 = Token::new(Sigil::from("A"), 3, "dog", "dog");

        assert_eq!(t1, t2);
    }

    #[test]
    fn test_tokens_to_string() {
        let tokens = vec![
            Token::new(Sigil::from("A"), 0, "black", "black"),
            Token::new(Sigil::from("A"), 1, "cat", "cat"),
        ];
        assert_eq!(tokens_to_string(&tokens), "black cat");
    }
}
