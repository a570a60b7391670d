//! Canonical witness content for deterministic hashing.
//!
//! ## Purpose
//!
//! Collation summaries record a content hash per witness so that a table or
//! apparatus can be traced back to the exact transcriptions it came from.
//!
//! ## Canonical Content Format
//!
//! ```text
//! canonical_content(tokens) = UTF-8(join("\n", normalize_newlines(trim(content)) for each token))
//! ```
//!
//! Where:
//! - `trim`: Remove leading and trailing whitespace of each token's raw content
//! - `normalize_newlines`: CRLF → LF, CR → LF inside a token
//! - `join`: Tokens are separated by a single LF
//!
//! Only raw content is hashed. The sigil, ordinals and normalized forms are
//! excluded, so renaming a witness or switching tokenizer normalization does
//! not change its content hash.

use sha2::{Digest, Sha256};

use crate::types::Token;

/// Version of the canonical content format.
///
/// Increment this when the canonicalization algorithm changes.
pub const CANONICAL_CONTENT_VERSION: &str = "1.0.0";

/// Normalize one token's raw content to canonical form.
///
/// # Example
///
/// ```rust
/// use collation_kernel::canonical_content::normalize_text;
///
/// assert_eq!(normalize_text("  line\r\nbreak "), "line\nbreak");
/// ```
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Convert a token sequence to canonical bytes for hashing.
pub fn canonical_content<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> Vec<u8> {
    tokens
        .into_iter()
        .map(|t| normalize_text(t.content()))
        .collect::<Vec<_>>()
        .join("\n")
        .into_bytes()
}

/// Compute the SHA-256 content hash of a token sequence.
///
/// Returned as a 64-character lowercase hex string.
pub fn compute_content_hash<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_content(tokens));
    hex::encode(hasher.finalize())
}

/// Check a token sequence against an expected content hash.
pub fn verify_content_hash<'a>(
    tokens: impl IntoIterator<Item = &'a Token>,
    expected_hash: &str,
) -> bool {
    compute_content_hash(tokens) == expected_hash.to_lowercase()
}
