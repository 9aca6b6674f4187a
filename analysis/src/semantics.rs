//! Semantics module, re-exported from loopfix-core.

pub use loopfix_core::semantics::typescript;
pub use loopfix_core::semantics::{SourceSemantics, build_source_semantics};
