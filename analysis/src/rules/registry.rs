use std::collections::HashSet;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::rules::Rule;
use crate::rules::typescript::no_async_in_foreach::TypescriptNoAsyncInForEachRule;

#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn all(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Rule>> {
        self.rules.iter().find(|r| r.id() == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rules.iter().any(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Keep only the rules whose id is listed. Unknown ids are ignored.
    pub fn filter_by_ids(&self, ids: &[String]) -> Self {
        let id_set: HashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
        Self {
            rules: self
                .rules
                .iter()
                .filter(|r| id_set.contains(r.id()))
                .cloned()
                .collect(),
        }
    }

    /// All built-in rules with default settings.
    pub fn with_builtin_rules() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    /// Built-in rules configured from `config`, minus `disabled_rules`.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut registry = RuleRegistry::new();
        registry.register(Arc::new(
            TypescriptNoAsyncInForEachRule::new().with_autofix(config.autofix),
        ));

        for id in &config.disabled_rules {
            if !registry.contains(id) {
                tracing::warn!(rule_id = %id, "disabled rule is not registered");
            }
        }
        registry.rules.retain(|r| !config.disabled_rules.iter().any(|id| id == r.id()));

        registry
    }
}
