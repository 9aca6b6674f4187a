use serde::{Deserialize, Serialize};

use crate::parse::ast::FileId;
use crate::types::context::Dimension;
use crate::types::finding::{Finding, FindingKind, Severity};
use crate::types::patch::FilePatch;

/// A finding as produced by a rule (engine-internal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFinding {
    pub rule_id: String,

    pub title: String,

    pub description: Option<String>,

    pub kind: FindingKind,

    pub severity: Severity,

    /// Confidence score [0.0, 1.0].
    pub confidence: f32,

    pub dimension: Dimension,

    pub file_id: FileId,
    pub file_path: String,

    /// 1-based line + column of the primary location.
    pub line: Option<u32>,
    pub column: Option<u32>,

    pub end_line: Option<u32>,
    pub end_column: Option<u32>,

    /// (start_byte, end_byte) of the flagged node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_range: Option<(usize, usize)>,

    /// Edit that resolves the finding, when one is safe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<FilePatch>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_preview: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<RuleFinding> for Finding {
    fn from(rf: RuleFinding) -> Self {
        Self {
            id: format!("{}:{}:{}", rf.rule_id, rf.file_path, rf.line.unwrap_or(0)),
            rule_id: rf.rule_id,
            kind: rf.kind,
            title: rf.title,
            description: rf.description.unwrap_or_default(),
            severity: rf.severity,
            confidence: rf.confidence,
            dimension: rf.dimension,
            file_path: rf.file_path,
            line: rf.line,
            column: rf.column,
            end_line: rf.end_line,
            end_column: rf.end_column,
            byte_range: rf.byte_range,
            diff: None, // filled in by the session
            fix_preview: rf.fix_preview,
        }
    }
}
