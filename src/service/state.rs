//! Service state management.
//!
//! Contains the ConfigRegistry and shared service state.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::canonical::canonical_hash_hex;
use crate::config::{CollationConfig, ConfigError};
use crate::tokenizer::SimpleTokenizer;

/// Reference to a registered config by hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigRef {
    /// Config version identifier (e.g., "collation_config_v1")
    pub config_id: String,
    /// xxHash64 of canonical config JSON
    pub params_hash: String,
}

impl ConfigRef {
    /// Reference a config.
    pub fn from_config(config: &CollationConfig) -> Self {
        Self {
            config_id: config.config_id().to_string(),
            params_hash: config.params_hash(),
        }
    }

    /// Create a reference with explicit values.
    pub fn new(config_id: impl Into<String>, params_hash: impl Into<String>) -> Self {
        Self {
            config_id: config_id.into(),
            params_hash: params_hash.into(),
        }
    }
}

/// Registry of immutable configs keyed by their hash.
///
/// The registry fingerprint changes whenever a config is added.
#[derive(Debug, Clone)]
pub struct ConfigRegistry {
    configs: BTreeMap<ConfigRef, CollationConfig>,
    registry_fingerprint: String,
}

impl ConfigRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        let mut registry = Self {
            configs: BTreeMap::new(),
            registry_fingerprint: String::new(),
        };
        registry.update_fingerprint();
        registry
    }

    /// Create a registry with the default config pre-registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(CollationConfig::default());
        registry
    }

    /// Register a config and return its reference.
    ///
    /// Registering an identical config again returns the existing reference.
    pub fn register(&mut self, config: CollationConfig) -> ConfigRef {
        let config_ref = ConfigRef::from_config(&config);
        if !self.configs.contains_key(&config_ref) {
            self.configs.insert(config_ref.clone(), config);
            self.update_fingerprint();
        }
        config_ref
    }

    /// Resolve a reference to its config.
    pub fn resolve(&self, config_ref: &ConfigRef) -> Option<&CollationConfig> {
        self.configs.get(config_ref)
    }

    /// Find a config by hash alone.
    pub fn find_by_hash(&self, params_hash: &str) -> Option<(&ConfigRef, &CollationConfig)> {
        self.configs.iter().find(|(r, _)| r.params_hash == params_hash)
    }

    /// All registered references.
    pub fn list(&self) -> Vec<ConfigRef> {
        self.configs.keys().cloned().collect()
    }

    /// Get the registry fingerprint.
    pub fn fingerprint(&self) -> &str {
        &self.registry_fingerprint
    }

    /// Get the number of registered configs.
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    fn update_fingerprint(&mut self) {
        let refs: Vec<_> = self.configs.keys().collect();
        self.registry_fingerprint = canonical_hash_hex(&refs);
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Shared service state.
///
/// Every request collates into its own in-memory session; the state only
/// holds what requests share.
#[derive(Debug, Clone)]
pub struct ServiceState {
    /// Config used when a request names none.
    pub default_config: Arc<CollationConfig>,
    /// Registry of available configs.
    pub config_registry: Arc<RwLock<ConfigRegistry>>,
    /// Tokenizer applied to submitted texts.
    pub tokenizer: Arc<SimpleTokenizer>,
}

impl ServiceState {
    /// Create state around a default config, registered up front.
    pub fn new(default_config: CollationConfig) -> Self {
        let mut registry = ConfigRegistry::with_defaults();
        registry.register(default_config.clone());
        Self::with_registry(default_config, registry)
    }

    /// Create state with a custom registry.
    pub fn with_registry(default_config: CollationConfig, registry: ConfigRegistry) -> Self {
        Self {
            default_config: Arc::new(default_config),
            config_registry: Arc::new(RwLock::new(registry)),
            tokenizer: Arc::new(SimpleTokenizer::new()),
        }
    }

    /// Create state from `COLLATION_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(CollationConfig::from_env()?))
    }

    /// Reference to the default config.
    pub fn default_ref(&self) -> ConfigRef {
        ConfigRef::from_config(&self.default_config)
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new(CollationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AlgorithmKind;
    use crate::comparator::ComparatorKind;

    fn nw_config() -> CollationConfig {
        CollationConfig::new(AlgorithmKind::needleman_wunsch(), ComparatorKind::Equality)
    }

    #[test]
    fn test_config_registry_register() {
        let mut registry = ConfigRegistry::new();
        let ref1 = registry.register(nw_config());
        let ref2 = registry.register(nw_config());

        assert_eq!(ref1, ref2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_config_registry_resolve() {
        let mut registry = ConfigRegistry::new();
        let config_ref = registry.register(nw_config());

        assert_eq!(registry.resolve(&config_ref), Some(&nw_config()));
        assert!(registry.find_by_hash(&config_ref.params_hash).is_some());
        assert!(registry.find_by_hash("0000000000000000").is_none());
    }

    #[test]
    fn test_config_registry_fingerprint_changes() {
        let mut registry = ConfigRegistry::new();
        let initial = registry.fingerprint().to_string();
        registry.register(nw_config());

        assert_ne!(registry.fingerprint(), initial);
    }

    #[test]
    fn test_state_registers_default_config() {
        let state = ServiceState::new(nw_config());
        let registry = state.config_registry.read();

        assert_eq!(registry.len(), 2);
        assert!(registry.resolve(&state.default_ref()).is_some());
        assert_eq!(state.default_ref().config_id, "collation_config_v1");
    }
}
