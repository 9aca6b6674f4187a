//! Call-site semantics for TypeScript and JavaScript sources.
//!
//! Both grammars share node kinds for everything the rules look at, so a
//! single model serves both languages.

pub mod callsite;
pub mod model;

use anyhow::Result;

use crate::parse::ast::ParsedFile;
use model::TsFileSemantics;

/// Build the semantic model for a single TypeScript or JavaScript file.
///
/// This is the entry point the engine calls after parsing.
pub fn build_typescript_semantics(parsed: &ParsedFile) -> Result<TsFileSemantics> {
    Ok(TsFileSemantics::from_parsed(parsed))
}
