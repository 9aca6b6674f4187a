use serde::{Deserialize, Serialize};

/// Languages the parser front-end understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Typescript,
    Javascript,
}

impl Language {
    /// Guess the language from a file path's extension.
    ///
    /// `.ts`, `.tsx`, `.mts` and `.cts` map to TypeScript; `.js`, `.jsx`,
    /// `.mjs` and `.cjs` map to JavaScript. Anything else is `None`.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.').map(|(_, ext)| ext)?;
        match ext {
            "ts" | "tsx" | "mts" | "cts" => Some(Language::Typescript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::Javascript),
            _ => None,
        }
    }
}

/// Dimensions of analysis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Dimension {
    Correctness,
    Stability,
    Reliability,
}

/// A source file included in a context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub language: Language,
    pub content: String,
}

/// Input for one context in a review session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContextInput {
    pub id: String,
    pub label: String,
    pub dimension: Dimension,
    pub files: Vec<SourceFile>,
}
