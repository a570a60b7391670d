//! Collation run configuration.
//!
//! A config fixes everything that changes alignment results: the aligner,
//! the comparator and the resource limits. `params_hash` is an xxHash64 of
//! the canonical JSON form, so two runs with the same hash used the same
//! parameters.

use serde::{Deserialize, Serialize};

use crate::align::AlgorithmKind;
use crate::canonical::canonical_hash_hex;
use crate::comparator::ComparatorKind;
use crate::types::CollationLimits;
use crate::DEFAULT_CONFIG_VERSION;

/// Environment variable selecting the aligner.
pub const ENV_ALGORITHM: &str = "COLLATION_ALGORITHM";
/// Environment variable enabling near matching with the given threshold.
pub const ENV_NEAR_MATCH: &str = "COLLATION_NEAR_MATCH";
/// Environment variable capping witnesses per run.
pub const ENV_MAX_WITNESSES: &str = "COLLATION_MAX_WITNESSES";
/// Environment variable capping tokens per witness.
pub const ENV_MAX_TOKENS: &str = "COLLATION_MAX_TOKENS";
/// Environment variable capping alignment cells.
pub const ENV_MAX_CELLS: &str = "COLLATION_MAX_CELLS";
/// Environment variable capping candidate matches for island search.
pub const ENV_MAX_MATCHES: &str = "COLLATION_MAX_MATCHES";

/// Error raised for malformed configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A config parameter is out of range.
    #[error("Invalid config parameter: {0}")]
    InvalidParameter(String),

    /// A variable is set to something unusable.
    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidVar {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// What went wrong.
        reason: String,
    },
}

/// Configuration of one collation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollationConfig {
    /// Config version identifier.
    pub version: String,
    /// Aligner.
    pub algorithm: AlgorithmKind,
    /// Token comparator.
    pub comparator: ComparatorKind,
    /// Input-size guards.
    pub limits: CollationLimits,
}

impl CollationConfig {
    /// Create a config with default limits.
    pub fn new(algorithm: AlgorithmKind, comparator: ComparatorKind) -> Self {
        Self {
            version: DEFAULT_CONFIG_VERSION.to_string(),
            algorithm,
            comparator,
            limits: CollationLimits::default(),
        }
    }

    /// Replace the limits.
    pub fn with_limits(mut self, limits: CollationLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Get the config ID.
    pub fn config_id(&self) -> &str {
        &self.version
    }

    /// Reject parameters the aligners cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.algorithm.validate().map_err(ConfigError::InvalidParameter)
    }

    /// Hash of the canonical parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }

    /// Build a config from `COLLATION_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_ALGORITHM) {
            config.algorithm = value.parse().map_err(|reason| ConfigError::InvalidVar {
                name: ENV_ALGORITHM,
                value: value.clone(),
                reason,
            })?;
        }
        if let Some(value) = lookup(ENV_NEAR_MATCH) {
            let threshold = parse_usize(ENV_NEAR_MATCH, &value)?;
            config.comparator = ComparatorKind::NearMatch { threshold };
        }
        if let Some(value) = lookup(ENV_MAX_WITNESSES) {
            config.limits.max_witnesses = parse_usize(ENV_MAX_WITNESSES, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_TOKENS) {
            config.limits.max_tokens_per_witness = parse_usize(ENV_MAX_TOKENS, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_CELLS) {
            config.limits.max_alignment_cells = parse_usize(ENV_MAX_CELLS, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_MATCHES) {
            config.limits.max_alignment_matches = parse_usize(ENV_MAX_MATCHES, &value)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_usize(name: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidVar {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl Default for CollationConfig {
    fn default() -> Self {
        Self::new(AlgorithmKind::Islands, ComparatorKind::Equality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_params_hash_determinism() {
        let c1 = CollationConfig::default();
        let c2 = CollationConfig::default();
        assert_eq!(c1.params_hash(), c2.params_hash());
        assert_eq!(c1.params_hash().len(), 16);
    }

    #[test]
    fn test_params_hash_changes_with_parameters() {
        let c1 = CollationConfig::default();
        let c2 = CollationConfig::new(AlgorithmKind::needleman_wunsch(), ComparatorKind::Equality);
        let c3 = CollationConfig::default().with_limits(CollationLimits::new(2, 2, 2));

        assert_ne!(c1.params_hash(), c2.params_hash());
        assert_ne!(c1.params_hash(), c3.params_hash());
    }

    #[test]
    fn test_from_lookup() {
        let config = CollationConfig::from_lookup(lookup(&[
            (ENV_ALGORITHM, "needleman-wunsch"),
            (ENV_NEAR_MATCH, "2"),
            (ENV_MAX_TOKENS, "500"),
        ]))
        .unwrap();

        assert_eq!(config.algorithm, AlgorithmKind::needleman_wunsch());
        assert_eq!(config.comparator, ComparatorKind::NearMatch { threshold: 2 });
        assert_eq!(config.limits.max_tokens_per_witness, 500);
        assert_eq!(config.limits.max_witnesses, CollationLimits::default().max_witnesses);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = CollationConfig::from_lookup(lookup(&[(ENV_MAX_CELLS, "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: ENV_MAX_CELLS, .. }));

        let err = CollationConfig::from_lookup(lookup(&[(ENV_ALGORITHM, "magic")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: ENV_ALGORITHM, .. }));
    }

    #[test]
    fn test_from_lookup_match_limit() {
        let config = CollationConfig::from_lookup(lookup(&[(ENV_MAX_MATCHES, "5000")])).unwrap();
        assert_eq!(config.limits.max_alignment_matches, 5000);
    }

    #[test]
    fn test_validate_rejects_extreme_scores() {
        let config = CollationConfig::new(
            AlgorithmKind::NeedlemanWunsch { match_score: 1, gap_cost: i64::MAX },
            ComparatorKind::Equality,
        );
        assert!(matches!(config.validate(), Err(ConfigError::InvalidParameter(_))));
        assert!(CollationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = CollationConfig::new(
            AlgorithmKind::needleman_wunsch(),
            ComparatorKind::NearMatch { threshold: 1 },
        );
        let json = serde_json::to_string(&config).unwrap();
        let back: CollationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.params_hash(), config.params_hash());
    }
}
