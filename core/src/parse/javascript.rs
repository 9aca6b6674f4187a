use std::sync::Arc;

use anyhow::Result;
use tree_sitter::Parser;

use crate::parse::ast::{FileId, ParsedFile};
use crate::types::context::{Language, SourceFile};

/// Parse a JavaScript (or JSX) source file into a `ParsedFile`.
pub fn parse_javascript_file(file_id: FileId, sf: &SourceFile) -> Result<ParsedFile> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_javascript::LANGUAGE.into())?;

    let source = Arc::new(sf.content.clone());
    let tree = parser
        .parse(&*source, None)
        .ok_or_else(|| anyhow::anyhow!("failed to parse JavaScript source"))?;

    Ok(ParsedFile {
        file_id,
        path: sf.path.clone(),
        language: Language::Javascript,
        source,
        tree,
    })
}
