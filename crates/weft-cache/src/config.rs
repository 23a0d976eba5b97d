use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use weft_rdfize::{DatatypeHandling, UnknownDatatypeHandling};

/// Engine configuration, fixed at construction.
///
/// The field names deserialise from the historical property keys
/// (`memoryCacheCapacity`, `cacheLifetime`, …); [`CacheConfig::from_properties`]
/// is the compatibility shim for string-keyed option bags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// In-memory metadata index capacity. Values below the floor of 100 are
    /// overridden with a warning.
    pub memory_cache_capacity: usize,
    /// Seconds a terminal cache entry stays fresh.
    pub cache_lifetime: u64,
    pub datatype_handling: DatatypeHandling,
    /// When false, fresh blank nodes are replaced by minted IRIs.
    pub use_blank_nodes: bool,
    pub deref_subjects: bool,
    pub deref_predicates: bool,
    pub deref_objects: bool,
    pub deref_contexts: bool,
    /// Commit (and reopen a transaction) after every retrieval.
    pub auto_commit: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            memory_cache_capacity: 10_000,
            cache_lifetime: 604_800,
            datatype_handling: DatatypeHandling::Ignore,
            use_blank_nodes: false,
            deref_subjects: true,
            deref_predicates: false,
            deref_objects: true,
            deref_contexts: false,
            auto_commit: true,
        }
    }
}

impl CacheConfig {
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.cache_lifetime)
    }

    /// Whether the query layer should request dereferencing for IRIs seen in
    /// `position`. The engine itself never consults this.
    pub fn should_dereference(&self, position: StatementPosition) -> bool {
        match position {
            StatementPosition::Subject => self.deref_subjects,
            StatementPosition::Predicate => self.deref_predicates,
            StatementPosition::Object => self.deref_objects,
            StatementPosition::Context => self.deref_contexts,
        }
    }

    /// Compatibility shim for the historical string-property configuration.
    /// Unrecognised keys are ignored; unparseable values and unknown
    /// `datatypeHandling` variants are fatal.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = CacheConfig::default();
        for (key, value) in properties {
            match key.as_str() {
                "memoryCacheCapacity" => {
                    config.memory_cache_capacity = parse(key, value)?;
                }
                "cacheLifetime" => config.cache_lifetime = parse(key, value)?,
                "datatypeHandling" => {
                    config.datatype_handling = value.parse()?;
                }
                "useBlankNodes" => config.use_blank_nodes = parse(key, value)?,
                "derefSubjects" => config.deref_subjects = parse(key, value)?,
                "derefPredicates" => config.deref_predicates = parse(key, value)?,
                "derefObjects" => config.deref_objects = parse(key, value)?,
                "derefContexts" => config.deref_contexts = parse(key, value)?,
                "autoCommit" => config.auto_commit = parse(key, value)?,
                _ => {}
            }
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

/// The four positions of a statement, as walked by the query layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementPosition {
    Subject,
    Predicate,
    Object,
    Context,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },

    #[error(transparent)]
    DatatypeHandling(#[from] UnknownDatatypeHandling),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.memory_cache_capacity, 10_000);
        assert_eq!(config.lifetime(), Duration::from_secs(604_800));
        assert_eq!(config.datatype_handling, DatatypeHandling::Ignore);
        assert!(!config.use_blank_nodes);
        assert!(config.should_dereference(StatementPosition::Subject));
        assert!(!config.should_dereference(StatementPosition::Predicate));
        assert!(config.should_dereference(StatementPosition::Object));
        assert!(!config.should_dereference(StatementPosition::Context));
    }

    #[test]
    fn from_properties_overrides_known_keys() -> anyhow::Result<()> {
        let config = CacheConfig::from_properties(&properties(&[
            ("memoryCacheCapacity", "250"),
            ("cacheLifetime", "3600"),
            ("datatypeHandling", "verify"),
            ("useBlankNodes", "true"),
            ("somethingUnrelated", "whatever"),
        ]))?;
        assert_eq!(config.memory_cache_capacity, 250);
        assert_eq!(config.cache_lifetime, 3600);
        assert_eq!(config.datatype_handling, DatatypeHandling::Verify);
        assert!(config.use_blank_nodes);
        Ok(())
    }

    #[test]
    fn unknown_datatype_handling_is_fatal() {
        let result =
            CacheConfig::from_properties(&properties(&[("datatypeHandling", "sometimes")]));
        assert!(matches!(result, Err(ConfigError::DatatypeHandling(_))));
    }

    #[test]
    fn malformed_numbers_are_fatal() {
        let result =
            CacheConfig::from_properties(&properties(&[("memoryCacheCapacity", "lots")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn deserialises_from_camel_case() -> anyhow::Result<()> {
        let config: CacheConfig = serde_json::from_str(
            r#"{"memoryCacheCapacity": 500, "datatypeHandling": "normalize"}"#,
        )?;
        assert_eq!(config.memory_cache_capacity, 500);
        assert_eq!(config.datatype_handling, DatatypeHandling::Normalize);
        // Unset keys keep their defaults.
        assert!(config.deref_subjects);
        Ok(())
    }
}
