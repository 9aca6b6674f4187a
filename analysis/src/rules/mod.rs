pub mod finding;
pub mod registry;

pub mod typescript;

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::parse::ast::FileId;
use crate::rules::finding::RuleFinding;
use crate::semantics::SourceSemantics;

/// A single rule loopfix can run.
///
/// Rules are pure: they inspect semantics and return findings.
/// They do not mutate engine state.
#[async_trait]
pub trait Rule: Send + Sync + Debug {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    /// Evaluate the rule against the provided semantics.
    ///
    /// Findings come out per file in document order.
    async fn evaluate(&self, semantics: &[(FileId, Arc<SourceSemantics>)]) -> Vec<RuleFinding>;
}
