use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attach patches to findings. With this off rules still report but
    /// never propose edits.
    pub autofix: bool,

    /// Upper bound on rewrite passes in `Engine::fix_source`. Nested
    /// matches need one pass per nesting level.
    pub max_fix_passes: usize,

    /// Rule ids left out of the registry built by `RuleRegistry::from_config`.
    pub disabled_rules: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autofix: true,
            max_fix_passes: 10,
            disabled_rules: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.autofix);
        assert_eq!(config.max_fix_passes, 10);
        assert!(config.disabled_rules.is_empty());
    }

    #[test]
    fn test_config_serialize_deserialize() {
        let config = EngineConfig {
            autofix: false,
            max_fix_passes: 3,
            disabled_rules: vec!["typescript.no_async_in_foreach".to_string()],
        };

        let json = serde_json::to_string(&config).expect("serialization should succeed");
        let back: EngineConfig =
            serde_json::from_str(&json).expect("deserialization should succeed");
        assert!(!back.autofix);
        assert_eq!(back.max_fix_passes, 3);
        assert_eq!(back.disabled_rules, config.disabled_rules);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"autofix": false}"#).expect("deserialization should succeed");
        assert!(!config.autofix);
        assert_eq!(config.max_fix_passes, 10);
    }

    #[test]
    fn test_config_debug() {
        let debug_str = format!("{:?}", EngineConfig::default());
        assert!(debug_str.contains("EngineConfig"));
        assert!(debug_str.contains("max_fix_passes"));
    }
}
