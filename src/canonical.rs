//! Canonical serialization for fingerprints and config hashes.
//!
//! Everything hashed here serializes through `serde_json` with a fixed
//! layout:
//!
//! - Struct fields in declaration order
//! - Sequences in index order
//! - Maps as `BTreeMap`/`BTreeSet` only, never `HashMap`
//! - Enums internally tagged, so variant names are part of the hash

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes.
///
/// Only called on types whose serialization cannot fail (no non-string map
/// keys, no custom fallible serializers).
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// xxHash64 of the canonical bytes.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// `canonical_hash` as 16 lowercase hex digits.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
