use serde::{Deserialize, Serialize};

use crate::types::finding::Finding;
use crate::types::meta::ReviewSessionMeta;

/// Result of a full review session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewSessionResult {
    pub meta: ReviewSessionMeta,
    pub contexts: Vec<ContextResult>,
}

/// Result of analyzing a single context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResult {
    pub context_id: String,
    pub label: String,
    pub findings: Vec<Finding>,
}

impl ReviewSessionResult {
    /// All findings across every context, in context order.
    pub fn all_findings(&self) -> impl Iterator<Item = &Finding> {
        self.contexts.iter().flat_map(|ctx| ctx.findings.iter())
    }
}
