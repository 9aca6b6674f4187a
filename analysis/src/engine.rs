use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::parse::ast::FileId;
use crate::rules::finding::RuleFinding;
use crate::rules::registry::RuleRegistry;
use crate::session::InternalSessionState;
use crate::types::context::{Dimension, SessionContextInput, SourceFile};
use crate::types::meta::ReviewSessionMeta;
use crate::types::patch::{FilePatch, PatchHunk, apply_file_patch, non_overlapping_hunks};
use crate::types::session_result::ReviewSessionResult;

/// Result of [`Engine::fix_source`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOutcome {
    /// The rewritten source.
    pub content: String,
    /// Number of edits applied across all passes.
    pub applied: usize,
    /// Findings still reported on `content`.
    pub remaining: usize,
}

/// The loopfix analysis engine.
///
/// Thread-safe; configuration and rules can be hot-swapped via `ArcSwap`.
///
/// ```rust,ignore
/// let engine = Engine::with_default_config();
///
/// let result = engine.analyze(meta, contexts).await?;
/// let outcome = engine.fix_source(&source).await?;
/// ```
pub struct Engine {
    pub config: ArcSwap<EngineConfig>,
    pub rule_registry: ArcSwap<RuleRegistry>,
}

impl Engine {
    pub fn new(config: EngineConfig, rule_registry: RuleRegistry) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            rule_registry: ArcSwap::from_pointee(rule_registry),
        }
    }

    /// Default configuration with the built-in rules.
    pub fn with_default_config() -> Self {
        Self::from_config(EngineConfig::default())
    }

    /// Built-in rules configured from `config`.
    pub fn from_config(config: EngineConfig) -> Self {
        let registry = RuleRegistry::from_config(&config);
        Self::new(config, registry)
    }

    /// Swap in a new configuration and rebuild the rule registry from it.
    pub fn reconfigure(&self, config: EngineConfig) {
        self.rule_registry
            .store(Arc::new(RuleRegistry::from_config(&config)));
        self.config.store(Arc::new(config));
    }

    /// Analyze a set of contexts with every registered rule.
    ///
    /// One request in, one result out; all state lives inside the call.
    pub async fn analyze(
        &self,
        meta: ReviewSessionMeta,
        contexts: Vec<SessionContextInput>,
    ) -> Result<ReviewSessionResult, EngineError> {
        let rules = self.rule_registry.load_full();
        let mut state = InternalSessionState::new(meta, contexts, rules);
        state.run().await
    }

    /// Analyze with the listed rules only. Unknown ids are ignored.
    pub async fn analyze_with_rules(
        &self,
        meta: ReviewSessionMeta,
        contexts: Vec<SessionContextInput>,
        rule_ids: &[String],
    ) -> Result<ReviewSessionResult, EngineError> {
        let filtered = self.rule_registry.load_full().filter_by_ids(rule_ids);
        let mut state = InternalSessionState::new(meta, contexts, Arc::new(filtered));
        state.run().await
    }

    /// Apply fixes to one file until none applies or the pass limit is hit.
    ///
    /// Each pass applies every non-overlapping patch; when two patches
    /// overlap the enclosing one wins and the nested one is picked up by the
    /// next pass over the rewritten text.
    pub async fn fix_source(&self, source: &SourceFile) -> Result<FixOutcome, EngineError> {
        let config = self.config.load_full();
        if config.max_fix_passes == 0 {
            return Err(EngineError::Config(
                "max_fix_passes must be at least 1".to_string(),
            ));
        }
        let rules = self.rule_registry.load_full();

        let mut content = source.content.clone();
        let mut applied = 0;

        for pass in 1..=config.max_fix_passes {
            let findings = findings_for(source, &content, Arc::clone(&rules)).await?;
            let hunks: Vec<PatchHunk> = findings
                .into_iter()
                .filter_map(|f| f.patch)
                .flat_map(|p| p.hunks)
                .collect();
            if hunks.is_empty() {
                break;
            }

            let count = non_overlapping_hunks(content.len(), &hunks).len();
            content = apply_file_patch(
                &content,
                &FilePatch {
                    file_id: FileId(1),
                    hunks,
                },
            );
            applied += count;
            tracing::debug!(path = %source.path, pass, count, "applied fix pass");
        }

        let remaining = findings_for(source, &content, rules).await?.len();
        if remaining > 0 {
            tracing::debug!(path = %source.path, remaining, "findings left without a fix");
        }

        Ok(FixOutcome {
            content,
            applied,
            remaining,
        })
    }

    pub fn rules(&self) -> arc_swap::Guard<Arc<RuleRegistry>> {
        self.rule_registry.load()
    }
}

/// Findings for `content` analyzed as if it were `source`'s text.
async fn findings_for(
    source: &SourceFile,
    content: &str,
    rules: Arc<RuleRegistry>,
) -> Result<Vec<RuleFinding>, EngineError> {
    let context = SessionContextInput {
        id: "fix".to_string(),
        label: source.path.clone(),
        dimension: Dimension::Correctness,
        files: vec![SourceFile {
            path: source.path.clone(),
            language: source.language,
            content: content.to_string(),
        }],
    };
    let mut state = InternalSessionState::new(ReviewSessionMeta::default(), vec![context], rules);
    state.findings().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::context::Language;

    fn ts_file(content: &str) -> SourceFile {
        SourceFile {
            path: "jobs.ts".to_string(),
            language: Language::Typescript,
            content: content.to_string(),
        }
    }

    fn context(files: Vec<SourceFile>) -> SessionContextInput {
        SessionContextInput {
            id: "ctx-1".to_string(),
            label: "Jobs".to_string(),
            dimension: Dimension::Correctness,
            files,
        }
    }

    #[test]
    fn test_engine_with_default_config() {
        let engine = Engine::with_default_config();
        let config = engine.config.load();
        assert!(config.autofix);
        assert_eq!(config.max_fix_passes, 10);
        assert_eq!(engine.rules().len(), 1);
    }

    #[test]
    fn test_engine_config_is_arc_swappable() {
        let engine = Engine::with_default_config();
        engine.config.store(Arc::new(EngineConfig {
            max_fix_passes: 2,
            ..EngineConfig::default()
        }));
        assert_eq!(engine.config.load().max_fix_passes, 2);
    }

    #[test]
    fn test_reconfigure_rebuilds_registry() {
        let engine = Engine::with_default_config();
        engine.reconfigure(EngineConfig {
            disabled_rules: vec!["typescript.no_async_in_foreach".to_string()],
            ..EngineConfig::default()
        });
        assert!(engine.rules().is_empty());
        assert_eq!(engine.config.load().disabled_rules.len(), 1);
    }

    #[tokio::test]
    async fn test_engine_analyze_empty_contexts() {
        let engine = Engine::with_default_config();
        let result = engine
            .analyze(ReviewSessionMeta::default(), vec![])
            .await
            .unwrap();
        assert!(result.contexts.is_empty());
    }

    #[tokio::test]
    async fn test_engine_analyze_reports_async_foreach() {
        let engine = Engine::with_default_config();
        let result = engine
            .analyze(
                ReviewSessionMeta::default(),
                vec![context(vec![ts_file("items.forEach(async (x) => { await x; });\n")])],
            )
            .await
            .unwrap();
        let findings: Vec<_> = result.all_findings().collect();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "typescript.no_async_in_foreach");
        assert_eq!(findings[0].id, "typescript.no_async_in_foreach:jobs.ts:1");
        assert!(findings[0].diff.is_some());
    }

    #[tokio::test]
    async fn test_engine_analyze_with_unknown_rule_ids() {
        let engine = Engine::with_default_config();
        let result = engine
            .analyze_with_rules(
                ReviewSessionMeta::default(),
                vec![context(vec![ts_file("items.forEach(async (x) => x);")])],
                &["typescript.unknown".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(result.all_findings().count(), 0);
    }

    #[tokio::test]
    async fn test_fix_source_rewrites_and_is_idempotent() {
        let engine = Engine::with_default_config();
        let outcome = engine
            .fix_source(&ts_file("foo.forEach(async(bar,baz)=>{await bar})\n"))
            .await
            .unwrap();
        assert_eq!(
            outcome.content,
            "for (let baz = 0; baz < foo.length; baz++) {let bar = foo[baz];await bar}\n"
        );
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.remaining, 0);

        let again = engine.fix_source(&ts_file(&outcome.content)).await.unwrap();
        assert_eq!(again.content, outcome.content);
        assert_eq!(again.applied, 0);
    }

    #[tokio::test]
    async fn test_fix_source_handles_nested_calls_over_passes() {
        let engine = Engine::with_default_config();
        let source = "a.forEach(async (x) => { x.forEach(async (y) => { await y; }); });\n";
        let outcome = engine.fix_source(&ts_file(source)).await.unwrap();
        assert_eq!(
            outcome.content,
            "for (let x of a) { for (let y of x) { await y; }; };\n"
        );
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.remaining, 0);
    }

    #[tokio::test]
    async fn test_fix_source_respects_pass_limit() {
        let engine = Engine::from_config(EngineConfig {
            max_fix_passes: 1,
            ..EngineConfig::default()
        });
        let source = "a.forEach(async (x) => { x.forEach(async (y) => { await y; }); });\n";
        let outcome = engine.fix_source(&ts_file(source)).await.unwrap();
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.remaining, 1);
    }

    #[tokio::test]
    async fn test_fix_source_fixes_siblings_in_one_pass() {
        let engine = Engine::from_config(EngineConfig {
            max_fix_passes: 1,
            ..EngineConfig::default()
        });
        let source = "a.forEach(async (x) => x);\nb.forEach(async (y) => y);\n";
        let outcome = engine.fix_source(&ts_file(source)).await.unwrap();
        assert_eq!(
            outcome.content,
            "for (let x of a) {x};\nfor (let y of b) {y};\n"
        );
        assert_eq!(outcome.applied, 2);
    }

    #[tokio::test]
    async fn test_fix_source_keeps_unfixable_findings() {
        let engine = Engine::with_default_config();
        let source = "const r = items.forEach(async (x) => { await x; });\n";
        let outcome = engine.fix_source(&ts_file(source)).await.unwrap();
        assert_eq!(outcome.content, source);
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.remaining, 1);
    }

    #[tokio::test]
    async fn test_fix_source_without_autofix_changes_nothing() {
        let engine = Engine::from_config(EngineConfig {
            autofix: false,
            ..EngineConfig::default()
        });
        let source = "items.forEach(async (x) => { await x; });\n";
        let outcome = engine.fix_source(&ts_file(source)).await.unwrap();
        assert_eq!(outcome.content, source);
        assert_eq!(outcome.remaining, 1);
    }

    #[tokio::test]
    async fn test_fix_source_skips_suppressed_calls() {
        let engine = Engine::with_default_config();
        let source = "// loopfix-ignore: typescript.no_async_in_foreach\nitems.forEach(async (x) => { await x; });\n";
        let outcome = engine.fix_source(&ts_file(source)).await.unwrap();
        assert_eq!(outcome.content, source);
        assert_eq!(outcome.remaining, 0);
    }

    #[tokio::test]
    async fn test_fix_source_rejects_zero_passes() {
        let engine = Engine::from_config(EngineConfig {
            max_fix_passes: 0,
            ..EngineConfig::default()
        });
        let err = engine.fix_source(&ts_file("run();")).await.unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
