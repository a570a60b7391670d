//! Token comparators.
//!
//! A comparator decides whether two tokens from different witnesses count as
//! the same reading. It is supplied once per collation run and must stay the
//! same for the whole run; swapping it mid-run gives undefined alignments.
//!
//! ## Built-ins
//!
//! | Comparator | Rule |
//! |------------|------|
//! | `EqualityComparator` | normalized forms are equal |
//! | `NearMatchComparator` | Levenshtein distance of normalized forms ≤ threshold |
//!
//! The near-match comparator memoizes edit distances in a bounded LRU cache.
//! The cache never changes a result.

use lru::LruCache;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::types::Token;

/// Match predicate over tokens.
pub trait TokenComparator: Send + Sync {
    /// Whether `a` and `b` are the same reading.
    fn matches(&self, a: &Token, b: &Token) -> bool;
}

/// Exact equality of normalized forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualityComparator;

impl TokenComparator for EqualityComparator {
    fn matches(&self, a: &Token, b: &Token) -> bool {
        a.normalized() == b.normalized()
    }
}

/// Default near-match threshold.
pub const DEFAULT_NEAR_MATCH_THRESHOLD: usize = 1;

const DEFAULT_DISTANCE_CACHE_SIZE: usize = 4096;

/// Levenshtein-based comparator.
pub struct NearMatchComparator {
    threshold: usize,
    cache: RwLock<LruCache<DistanceKey, usize>>,
}

/// Order-insensitive cache key: the two normalized forms, smaller first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DistanceKey(String, String);

impl DistanceKey {
    fn new(a: &str, b: &str) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(lo.to_string(), hi.to_string())
    }
}

impl NearMatchComparator {
    /// Create a comparator accepting distances up to `threshold`.
    pub fn new(threshold: usize) -> Self {
        Self::with_cache_size(threshold, DEFAULT_DISTANCE_CACHE_SIZE)
    }

    /// Create a comparator with a custom cache capacity.
    pub fn with_cache_size(threshold: usize, cache_size: usize) -> Self {
        let size = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            threshold,
            cache: RwLock::new(LruCache::new(size)),
        }
    }

    /// Accepted edit distance.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of memoized distances.
    pub fn cached_distances(&self) -> usize {
        self.cache.read().len()
    }

    fn distance(&self, a: &str, b: &str) -> usize {
        let key = DistanceKey::new(a, b);
        if let Some(&d) = self.cache.read().peek(&key) {
            return d;
        }
        let d = levenshtein(a, b);
        self.cache.write().put(key, d);
        d
    }
}

impl Default for NearMatchComparator {
    fn default() -> Self {
        Self::new(DEFAULT_NEAR_MATCH_THRESHOLD)
    }
}

impl std::fmt::Debug for NearMatchComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NearMatchComparator")
            .field("threshold", &self.threshold)
            .field("cached_distances", &self.cached_distances())
            .finish()
    }
}

impl TokenComparator for NearMatchComparator {
    fn matches(&self, a: &Token, b: &Token) -> bool {
        let (x, y) = (a.normalized(), b.normalized());
        if x == y {
            return true;
        }
        let (lx, ly) = (x.chars().count(), y.chars().count());
        if lx.abs_diff(ly) > self.threshold {
            return false;
        }
        self.distance(x, y) <= self.threshold
    }
}

/// Levenshtein edit distance over `char`s.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Serializable comparator choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparatorKind {
    /// Exact normalized equality.
    #[default]
    Equality,
    /// Levenshtein distance up to `threshold`.
    NearMatch {
        /// Accepted edit distance.
        threshold: usize,
    },
}

impl ComparatorKind {
    /// Instantiate the comparator.
    pub fn build(&self) -> Box<dyn TokenComparator> {
        match *self {
            ComparatorKind::Equality => Box::new(EqualityComparator),
            ComparatorKind::NearMatch { threshold } => Box::new(NearMatchComparator::new(threshold)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sigil;

    fn tok(sigil: &str, text: &str) -> Token {
        Token::new(Sigil::from(sigil), 0, text, text.to_lowercase())
    }

    #[test]
    fn test_equality_uses_normalized_form() {
        let cmp = EqualityComparator;
        assert!(cmp.matches(&tok("A", "The"), &tok("B", "the")));
        assert!(!cmp.matches(&tok("A", "the"), &tok("B", "thee")));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("colour", "color"), 1);
        assert_eq!(levenshtein("çà", "ca"), 2);
    }

    #[test]
    fn test_near_match_threshold() {
        let cmp = NearMatchComparator::default();
        assert!(cmp.matches(&tok("A", "colour"), &tok("B", "color")));
        assert!(!cmp.matches(&tok("A", "kitten"), &tok("B", "sitting")));

        let loose = NearMatchComparator::new(3);
        assert!(loose.matches(&tok("A", "kitten"), &tok("B", "sitting")));
    }

    #[test]
    fn test_near_match_cache_is_symmetric() {
        let cmp = NearMatchComparator::new(2);
        assert!(cmp.matches(&tok("A", "black"), &tok("B", "blak")));
        assert!(cmp.matches(&tok("A", "blak"), &tok("B", "black")));
        assert_eq!(cmp.cached_distances(), 1);
    }

    #[test]
    fn test_distance_cache_keys_on_full_pair() {
        let cmp = NearMatchComparator::with_cache_size(1, 16);
        assert!(cmp.matches(&tok("A", "cat"), &tok("B", "cats")));
        assert!(!cmp.matches(&tok("A", "cat"), &tok("B", "dogs")));
        assert!(cmp.matches(&tok("A", "cats"), &tok("B", "cat")));
        assert_eq!(cmp.cached_distances(), 2);

        assert_eq!(DistanceKey::new("b", "a"), DistanceKey::new("a", "b"));
        assert_ne!(DistanceKey::new("ab", "c"), DistanceKey::new("a", "bc"));
    }

    #[test]
    fn test_kind_serde() {
        let kind = ComparatorKind::NearMatch { threshold: 2 };
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#"{"kind":"near_match","threshold":2}"#);
        let back: ComparatorKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }
}
