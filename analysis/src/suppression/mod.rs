//! Rule suppression via inline comments.
//!
//! ```text
//! // loopfix-ignore: typescript.no_async_in_foreach - reason
//! ```
//!
//! A comment in the file header (first 10 lines, before any code) covers
//! the whole file, a comment on its own line covers the next line, and a
//! trailing comment covers its own line.

mod filter;
mod model;
mod parser;

pub use filter::filter_suppressed_findings;
pub use model::{Suppression, SuppressionScope};
pub use parser::parse_suppressions;
