pub mod typescript;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::parse::ast::{FileId, ParsedFile};
use crate::types::context::Language;
use typescript::model::TsFileSemantics;

/// Language-agnostic wrapper for per-file semantics.
///
/// TypeScript and JavaScript share one model; the file's own language tag
/// is kept on the inner value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SourceSemantics {
    Typescript(TsFileSemantics),
}

impl SourceSemantics {
    pub fn language(&self) -> Language {
        match self {
            SourceSemantics::Typescript(sem) => sem.language,
        }
    }

    pub fn file_id(&self) -> FileId {
        match self {
            SourceSemantics::Typescript(sem) => sem.file_id,
        }
    }

    pub fn file_path(&self) -> &str {
        match self {
            SourceSemantics::Typescript(sem) => &sem.path,
        }
    }

    /// Original source text of the file.
    pub fn source(&self) -> &str {
        match self {
            SourceSemantics::Typescript(sem) => &sem.source,
        }
    }

    pub fn as_typescript(&self) -> Option<&TsFileSemantics> {
        match self {
            SourceSemantics::Typescript(sem) => Some(sem),
        }
    }
}

/// Build semantics for a parsed file, dispatching on its language.
pub fn build_source_semantics(parsed: &ParsedFile) -> Result<SourceSemantics> {
    match parsed.language {
        Language::Typescript | Language::Javascript => Ok(SourceSemantics::Typescript(
            typescript::build_typescript_semantics(parsed)?,
        )),
    }
}
