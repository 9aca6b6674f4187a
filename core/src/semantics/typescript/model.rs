use serde::{Deserialize, Serialize};

use crate::parse::ast::{FileId, ParsedFile};
use crate::types::context::Language;

use super::callsite::{Argument, Callback, Callee, TsCallSite, walk_call_sites};

/// Semantic model for a single TypeScript or JavaScript file.
///
/// Holds the source text so rules can emit patches and diffs without
/// going back to the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TsFileSemantics {
    pub file_id: FileId,
    pub path: String,
    pub language: Language,
    pub source: String,
    /// Every call expression, in document order.
    pub calls: Vec<TsCallSite>,
}

impl TsFileSemantics {
    pub fn from_parsed(parsed: &ParsedFile) -> Self {
        let mut calls = Vec::new();
        walk_call_sites(parsed, |call| calls.push(call));

        tracing::trace!(path = %parsed.path, calls = calls.len(), "collected call sites");

        Self {
            file_id: parsed.file_id,
            path: parsed.path.clone(),
            language: parsed.language,
            source: parsed.source.as_str().to_string(),
            calls,
        }
    }

    /// Method calls named `method`, paired with their function-valued
    /// first argument when there is one.
    pub fn method_calls<'a>(
        &'a self,
        method: &'a str,
    ) -> impl Iterator<Item = (&'a TsCallSite, Option<&'a Callback>)> + 'a {
        self.calls.iter().filter_map(move |call| match &call.callee {
            Callee::Member { property, .. } if property == method => {
                let callback = match &call.first_argument {
                    Some(Argument::Function(cb)) => Some(cb),
                    _ => None,
                };
                Some((call, callback))
            }
            _ => None,
        })
    }
}
