use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use scc::HashMap as ConcurrentHashMap;

use crate::error::EngineError;
use crate::parse::{
    self,
    ast::{FileId, ParsedFile},
};
use crate::rules::finding::RuleFinding;
use crate::rules::registry::RuleRegistry;
use crate::semantics::{SourceSemantics, build_source_semantics};
use crate::suppression::{filter_suppressed_findings, parse_suppressions};
use crate::types::context::SessionContextInput;
use crate::types::finding::Finding;
use crate::types::meta::ReviewSessionMeta;
use crate::types::session_result::{ContextResult, ReviewSessionResult};
use crate::types::{apply_file_patch, make_unified_diff};

/// Internal state for a single analysis run.
///
/// Pipeline:
/// 1. Parse all files
/// 2. Build semantics
/// 3. Run all rules
/// 4. Drop suppressed findings and unrequested dimensions
pub struct InternalSessionState {
    pub meta: ReviewSessionMeta,
    pub contexts: Vec<SessionContextInput>,

    /// Parsed files for this session (all contexts combined).
    pub parsed_files: ConcurrentHashMap<FileId, Arc<ParsedFile>>,

    pub semantics: ConcurrentHashMap<FileId, Arc<SourceSemantics>>,

    pub rules: Arc<RuleRegistry>,

    /// Mapping from file id → index into `contexts`.
    file_to_context: HashMap<FileId, usize>,
}

impl InternalSessionState {
    pub fn new(
        meta: ReviewSessionMeta,
        contexts: Vec<SessionContextInput>,
        rules: Arc<RuleRegistry>,
    ) -> Self {
        Self {
            meta,
            contexts,
            parsed_files: ConcurrentHashMap::new(),
            semantics: ConcurrentHashMap::new(),
            rules,
            file_to_context: HashMap::new(),
        }
    }

    /// Run the whole pipeline and group findings per context.
    pub async fn run(&mut self) -> Result<ReviewSessionResult, EngineError> {
        let findings = self.findings().await?;
        Ok(self.assemble(findings))
    }

    /// Run the pipeline up to filtered rule findings.
    ///
    /// Findings are ordered by file, then by position inside the file.
    pub async fn findings(&mut self) -> Result<Vec<RuleFinding>, EngineError> {
        self.parse_all_files().await?;
        self.build_all_semantics().await?;

        let findings = self.run_all_rules().await;
        let findings = self.filter_suppressions(findings);
        Ok(self.filter_by_dimensions(findings))
    }

    async fn parse_all_files(&mut self) -> Result<(), EngineError> {
        // Session-local ids, assigned in input order.
        let mut next_id: u64 = 1;

        for (ctx_index, ctx) in self.contexts.iter().enumerate() {
            for sf in &ctx.files {
                let file_id = FileId(next_id);
                next_id += 1;

                let parsed = Arc::new(parse::parse_source_file(file_id, sf)?);
                self.parsed_files
                    .insert_sync(file_id, parsed)
                    .map_err(|_| EngineError::Internal(anyhow!("duplicate file id {file_id:?}")))?;
                self.file_to_context.insert(file_id, ctx_index);
            }
        }

        tracing::debug!(files = self.file_to_context.len(), "parsed session files");
        Ok(())
    }

    async fn build_all_semantics(&self) -> Result<(), EngineError> {
        let mut entries: Vec<(FileId, Arc<ParsedFile>)> = Vec::new();
        self.parsed_files.iter_sync(|file_id, parsed| {
            entries.push((*file_id, Arc::clone(parsed)));
            true
        });

        for (file_id, parsed) in entries {
            let sem = build_source_semantics(parsed.as_ref()).map_err(|e| {
                EngineError::Internal(anyhow!("failed to build semantics for {}: {e}", parsed.path))
            })?;
            self.semantics
                .insert_sync(file_id, Arc::new(sem))
                .map_err(|_| {
                    EngineError::Internal(anyhow!(
                        "semantics already built for file {:?}",
                        file_id
                    ))
                })?;
        }

        Ok(())
    }

    async fn run_all_rules(&self) -> Vec<RuleFinding> {
        let mut sem_entries: Vec<(FileId, Arc<SourceSemantics>)> = Vec::new();
        self.semantics.iter_sync(|file_id, sem| {
            sem_entries.push((*file_id, Arc::clone(sem)));
            true
        });
        sem_entries.sort_by_key(|(file_id, _)| file_id.0);

        let mut all_rule_findings: Vec<RuleFinding> = Vec::new();
        for rule in self.rules.all() {
            let mut findings = rule.evaluate(&sem_entries).await;
            tracing::debug!(rule_id = rule.id(), count = findings.len(), "rule evaluated");
            all_rule_findings.append(&mut findings);
        }

        all_rule_findings.sort_by_key(|f| (f.file_id.0, f.byte_range.map(|(start, _)| start)));
        all_rule_findings
    }

    /// Drop findings silenced by `loopfix-ignore:` comments in their file.
    fn filter_suppressions(&self, findings: Vec<RuleFinding>) -> Vec<RuleFinding> {
        if findings.is_empty() {
            return findings;
        }

        let mut suppressions_by_file = HashMap::new();
        let mut kept = Vec::with_capacity(findings.len());
        for finding in findings {
            let file_id = finding.file_id;
            let suppressions = suppressions_by_file.entry(file_id).or_insert_with(|| {
                self.parsed_files
                    .read_sync(&file_id, |_, p| parse_suppressions(&p.source))
                    .unwrap_or_default()
            });
            kept.extend(filter_suppressed_findings(vec![finding], suppressions));
        }
        kept
    }

    /// Keep findings in the requested dimensions; no request keeps all.
    fn filter_by_dimensions(&self, findings: Vec<RuleFinding>) -> Vec<RuleFinding> {
        if self.meta.requested_dimensions.is_empty() {
            return findings;
        }

        findings
            .into_iter()
            .filter(|finding| self.meta.requested_dimensions.contains(&finding.dimension))
            .collect()
    }

    /// Convert rule findings into per-context results with unified diffs.
    fn assemble(&self, findings: Vec<RuleFinding>) -> ReviewSessionResult {
        let mut context_results: Vec<ContextResult> = self
            .contexts
            .iter()
            .map(|ctx| ContextResult {
                context_id: ctx.id.clone(),
                label: ctx.label.clone(),
                findings: Vec::new(),
            })
            .collect();

        for rf in findings {
            let file_id = rf.file_id;
            let patch = rf.patch.clone();

            let mut finding = Finding::from(rf);

            if let Some(patch) = patch {
                finding.diff = self.parsed_files.read_sync(&file_id, |_, parsed| {
                    let after = apply_file_patch(&parsed.source, &patch);
                    make_unified_diff(&parsed.path, &parsed.source, &after)
                });
            }

            match self
                .file_to_context
                .get(&file_id)
                .and_then(|&idx| context_results.get_mut(idx))
            {
                Some(ctx_result) => ctx_result.findings.push(finding),
                None => tracing::warn!(?file_id, "finding for a file outside every context"),
            }
        }

        ReviewSessionResult {
            meta: self.meta.clone(),
            contexts: context_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::context::{Dimension, Language, SourceFile};

    fn make_source_file(path: &str, content: &str) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            language: Language::from_path(path).expect("known extension"),
            content: content.to_string(),
        }
    }

    fn make_context(id: &str, files: Vec<SourceFile>) -> SessionContextInput {
        SessionContextInput {
            id: id.to_string(),
            label: format!("{id} label"),
            dimension: Dimension::Correctness,
            files,
        }
    }

    fn session(contexts: Vec<SessionContextInput>) -> InternalSessionState {
        InternalSessionState::new(
            ReviewSessionMeta::default(),
            contexts,
            Arc::new(RuleRegistry::with_builtin_rules()),
        )
    }

    #[test]
    fn new_state_is_empty() {
        let state = session(vec![]);
        assert!(state.parsed_files.is_empty());
        assert!(state.semantics.is_empty());
    }

    #[tokio::test]
    async fn parse_all_files_assigns_ids_across_contexts() {
        let mut state = session(vec![
            make_context("a", vec![make_source_file("a.ts", "run();")]),
            make_context("b", vec![make_source_file("b.js", "run();"), make_source_file("c.js", "")]),
        ]);
        state.parse_all_files().await.unwrap();
        assert_eq!(state.parsed_files.len(), 3);
        assert_eq!(state.file_to_context.get(&FileId(1)), Some(&0));
        assert_eq!(state.file_to_context.get(&FileId(3)), Some(&1));
    }

    #[tokio::test]
    async fn run_attaches_findings_to_their_context() {
        let mut state = session(vec![
            make_context("clean", vec![make_source_file("ok.ts", "items.map(async (x) => x);")]),
            make_context(
                "dirty",
                vec![make_source_file("bad.ts", "items.forEach(async (x) => { await x; });\n")],
            ),
        ]);
        let result = state.run().await.unwrap();
        assert_eq!(result.contexts.len(), 2);
        assert!(result.contexts[0].findings.is_empty());
        assert_eq!(result.contexts[1].findings.len(), 1);

        let finding = &result.contexts[1].findings[0];
        assert_eq!(finding.file_path, "bad.ts");
        let diff = finding.diff.as_deref().expect("diff for patched finding");
        assert!(diff.contains("-items.forEach(async (x) => { await x; });"));
        assert!(diff.contains("+for (let x of items) { await x; };"));
    }

    #[tokio::test]
    async fn suppressed_findings_are_dropped() {
        let code = "run();\n// loopfix-ignore: no_async_in_foreach - fire and forget\nitems.forEach(async (x) => x);\nother.forEach(async (x) => x);\n";
        let mut state = session(vec![make_context("ctx", vec![make_source_file("s.ts", code)])]);
        let findings = state.findings().await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(4));
    }

    #[tokio::test]
    async fn dimension_filter_applies() {
        let meta = ReviewSessionMeta {
            requested_dimensions: vec![Dimension::Stability],
            ..ReviewSessionMeta::default()
        };
        let mut state = InternalSessionState::new(
            meta,
            vec![make_context("ctx", vec![make_source_file("d.ts", "a.forEach(async (x) => x);")])],
            Arc::new(RuleRegistry::with_builtin_rules()),
        );
        assert!(state.findings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn findings_are_ordered_by_file_then_position() {
        let mut state = session(vec![make_context(
            "ctx",
            vec![
                make_source_file("one.ts", "a.forEach(async (x) => x);\nb.forEach(async (x) => x);\n"),
                make_source_file("two.ts", "c.forEach(async (x) => x);\n"),
            ],
        )]);
        let findings = state.findings().await.unwrap();
        let order: Vec<(&str, Option<u32>)> =
            findings.iter().map(|f| (f.file_path.as_str(), f.line)).collect();
        assert_eq!(
            order,
            vec![("one.ts", Some(1)), ("one.ts", Some(2)), ("two.ts", Some(1))]
        );
    }
}
