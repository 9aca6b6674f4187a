use thiserror::Error;

/// Errors that occur while parsing individual files.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse {file_path}: {source}")]
    File {
        file_path: String,
        #[source]
        source: anyhow::Error,
    },
}
