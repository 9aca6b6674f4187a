//! Types module, re-exported from loopfix-core.
//!
//! Shared type definitions live in `loopfix-core`; the analysis crate
//! reaches them through `crate::types::*`.

pub use loopfix_core::types::context;
pub use loopfix_core::types::finding;
pub use loopfix_core::types::meta;
pub use loopfix_core::types::patch;
pub use loopfix_core::types::session_result;

pub use patch::{FilePatch, PatchHunk, PatchRange, apply_file_patch, make_unified_diff};
