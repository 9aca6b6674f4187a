use serde::{Deserialize, Serialize};

use crate::types::context::{Dimension, Language};

/// High-level description of what this review session is about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewSessionMeta {
    /// Optional human-readable label (e.g. repo name, PR title).
    pub label: Option<String>,

    pub languages: Vec<Language>,

    /// Dimensions to keep in the result. Empty keeps everything.
    pub requested_dimensions: Vec<Dimension>,
}
