use std::sync::Arc;

use anyhow::Result;
use tree_sitter::{Language as TsLanguage, Parser};

use crate::parse::ast::{FileId, ParsedFile};
use crate::types::context::{Language, SourceFile};

fn typescript_language() -> TsLanguage {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

fn tsx_language() -> TsLanguage {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

/// Parse a TypeScript source file into a `ParsedFile`.
///
/// `.tsx` files use the TSX grammar so JSX in callbacks parses cleanly.
pub fn parse_typescript_file(file_id: FileId, sf: &SourceFile) -> Result<ParsedFile> {
    let mut parser = Parser::new();

    let lang = if sf.path.ends_with(".tsx") {
        tsx_language()
    } else {
        typescript_language()
    };

    parser.set_language(&lang)?;

    let source = Arc::new(sf.content.clone());
    let tree = parser
        .parse(&*source, None)
        .ok_or_else(|| anyhow::anyhow!("failed to parse TypeScript source"))?;

    Ok(ParsedFile {
        file_id,
        path: sf.path.clone(),
        language: Language::Typescript,
        source,
        tree,
    })
}
