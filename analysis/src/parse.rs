//! Parse module, re-exported from loopfix-core.

pub use loopfix_core::parse::ast;
pub use loopfix_core::parse::javascript;
pub use loopfix_core::parse::parse_source_file;
pub use loopfix_core::parse::typescript;
