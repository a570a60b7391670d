//! Default tokenizer.
//!
//! Splits text into words and single punctuation marks. Each token keeps the
//! matched text as raw content; the normalized form is trimmed and, unless
//! disabled, lowercased. No Unicode normalization is applied.

use regex_lite::Regex;

use crate::types::{Sigil, Witness};

const TOKEN_PATTERN: &str = r#"[^\s.,;:!?()\[\]"]+|[.,;:!?()\[\]"]"#;

/// Regex-based word/punctuation tokenizer.
#[derive(Debug, Clone)]
pub struct SimpleTokenizer {
    pattern: Regex,
    lowercase: bool,
}

impl SimpleTokenizer {
    /// Tokenizer that lowercases normalized forms.
    pub fn new() -> Self {
        Self::with_lowercase(true)
    }

    /// Tokenizer with explicit case handling.
    pub fn with_lowercase(lowercase: bool) -> Self {
        let pattern = Regex::new(TOKEN_PATTERN).expect("static token pattern compiles");
        Self { pattern, lowercase }
    }

    /// Split `text` into `(content, normalized)` pairs.
    pub fn split(&self, text: &str) -> Vec<(String, String)> {
        self.pattern
            .find_iter(text)
            .map(|m| {
                let content = m.as_str().to_string();
                let trimmed = content.trim();
                let normalized = if self.lowercase {
                    trimmed.to_lowercase()
                } else {
                    trimmed.to_string()
                };
                (content, normalized)
            })
            .collect()
    }

    /// Tokenize `text` into a witness.
    pub fn witness(&self, sigil: impl Into<Sigil>, text: &str) -> Witness {
        Witness::new(sigil, self.split(text))
    }
}

impl Default for SimpleTokenizer {
    fn default() -> Self {
        Self::new()
    }
}
