use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tree_sitter::{Node, Tree};

use crate::types::context::Language;

/// Engine-internal identifier for a file in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub u64);

/// Text range in (line, col) space; 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

/// Lightweight handle to "where in the AST" something lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstLocation {
    pub file_id: FileId,
    pub range: TextRange,
}

/// A fully parsed source file: source + tree-sitter AST + language tag.
#[derive(Debug)]
pub struct ParsedFile {
    pub file_id: FileId,
    pub path: String,
    pub language: Language,
    pub source: Arc<String>,
    pub tree: Tree,
}

impl ParsedFile {
    /// Convert a tree-sitter node range into a TextRange.
    pub fn location_for_node(&self, node: &Node) -> AstLocation {
        let range = node.range();
        let start = range.start_point;
        let end = range.end_point;

        AstLocation {
            file_id: self.file_id,
            range: TextRange {
                start_line: start.row as u32,
                start_col: start.column as u32,
                end_line: end.row as u32,
                end_col: end.column as u32,
            },
        }
    }

    /// Borrow the exact source text under a node.
    pub fn str_for_node(&self, node: &Node) -> &str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// Get the exact source text for a node.
    pub fn text_for_node(&self, node: &Node) -> String {
        self.str_for_node(node).to_string()
    }
}
