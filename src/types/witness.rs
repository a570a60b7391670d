//! Witness type: one ordered input sequence.

use serde::{Deserialize, Serialize};

use super::token::{Sigil, Token};
use crate::canonical_content::compute_content_hash;

/// Error raised when a witness is assembled from inconsistent tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WitnessError {
    /// A token claims a different witness.
    #[error("Token {ordinal} belongs to witness '{found}', expected '{expected}'")]
    ForeignToken {
        /// Sigil of the witness being built.
        expected: Sigil,
        /// Sigil carried by the token.
        found: Sigil,
        /// Ordinal of the offending token.
        ordinal: usize,
    },
    /// Token ordinals are not `0..len` in order.
    #[error("Witness '{sigil}' has token ordinal {found} at position {position}")]
    OrdinalGap {
        /// Sigil of the witness being built.
        sigil: Sigil,
        /// Position in the sequence.
        position: usize,
        /// Ordinal found at that position.
        found: usize,
    },
}

/// An immutable, ordered token sequence identified by a sigil.
///
/// Deserialized witnesses go through the same checks as [`Witness::from_tokens`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWitness")]
pub struct Witness {
    sigil: Sigil,
    tokens: Vec<Token>,
}

/// Unchecked wire form of a witness.
#[derive(Deserialize)]
struct RawWitness {
    sigil: Sigil,
    tokens: Vec<Token>,
}

impl TryFrom<RawWitness> for Witness {
    type Error = WitnessError;

    fn try_from(raw: RawWitness) -> Result<Self, Self::Error> {
        Witness::from_tokens(raw.sigil, raw.tokens)
    }
}

impl Witness {
    /// Build a witness from `(content, normalized)` pairs.
    ///
    /// Ordinals are assigned in sequence order.
    pub fn new<I, C, N>(sigil: impl Into<Sigil>, tokens: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let sigil = sigil.into();
        let tokens = tokens
            .into_iter()
            .enumerate()
            .map(|(i, (content, normalized))| Token::new(sigil.clone(), i, content, normalized))
            .collect();
        Self { sigil, tokens }
    }

    /// Build a witness whose normalized forms equal the raw content.
    pub fn from_words<I, W>(sigil: impl Into<Sigil>, words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        Self::new(
            sigil,
            words.into_iter().map(|w| {
                let w: String = w.into();
                (w.clone(), w)
            }),
        )
    }

    /// Build a witness from pre-made tokens, validating ownership and order.
    pub fn from_tokens(sigil: impl Into<Sigil>, tokens: Vec<Token>) -> Result<Self, WitnessError> {
        let sigil = sigil.into();
        for (position, token) in tokens.iter().enumerate() {
            if token.witness() != &sigil {
                return Err(WitnessError::ForeignToken {
                    expected: sigil,
                    found: token.witness().clone(),
                    ordinal: token.ordinal(),
                });
            }
            if token.ordinal() != position {
                return Err(WitnessError::OrdinalGap {
                    sigil,
                    position,
                    found: token.ordinal(),
                });
            }
        }
        Ok(Self { sigil, tokens })
    }

    /// Build a witness without checking its tokens.
    #[cfg(test)]
    pub(crate) fn new_unchecked(sigil: impl Into<Sigil>, tokens: Vec<Token>) -> Self {
        Self { sigil: sigil.into(), tokens }
    }

    /// The witness sigil.
    pub fn sigil(&self) -> &Sigil {
        &self.sigil
    }

    /// Tokens in reading order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the witness has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// SHA-256 hash of the witness's canonical content.
    pub fn content_hash(&self) -> String {
        compute_content_hash(&self.tokens)
    }
}
