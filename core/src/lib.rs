//! # loopfix-core
//!
//! Parsing and call-site semantics for TypeScript and JavaScript sources.
//!
//! - **Parsing**: tree-sitter grammars for TypeScript, TSX and JavaScript
//! - **Semantics**: a serializable view of every call expression, with
//!   callee chains and function-valued arguments resolved into tagged enums
//! - **Types**: findings, patches and session containers shared with the
//!   analysis crate
//!
//! ## Example
//!
//! ```rust,ignore
//! use loopfix_core::parse::parse_source_file;
//! use loopfix_core::semantics::build_source_semantics;
//! use loopfix_core::types::context::{Language, SourceFile};
//! use loopfix_core::parse::ast::FileId;
//!
//! let source = SourceFile {
//!     path: "jobs.ts".to_string(),
//!     language: Language::Typescript,
//!     content: "items.forEach(async (x) => await x);".to_string(),
//! };
//!
//! let parsed = parse_source_file(FileId(1), &source).unwrap();
//! let semantics = build_source_semantics(&parsed).unwrap();
//! ```

pub mod error;
pub mod parse;
pub mod semantics;
pub mod types;

pub use error::ParseError;
pub use parse::ast::{FileId, ParsedFile};
pub use semantics::SourceSemantics;
pub use types::context::{Language, SourceFile};
