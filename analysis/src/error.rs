use thiserror::Error;

pub use loopfix_core::error::ParseError;

/// Top-level error type exposed by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parsing error: {0}")]
    Parse(#[from] ParseError),

    /// "Catch-all" for unexpected internal failures.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
