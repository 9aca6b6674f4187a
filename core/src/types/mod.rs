pub mod context;
pub mod finding;
pub mod meta;
pub mod patch;
pub mod session_result;

pub use patch::{FilePatch, PatchHunk, PatchRange, apply_file_patch, make_unified_diff};
