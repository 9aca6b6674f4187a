//! loopfix-analysis: rule evaluation, autofix and suppression
//!
//! This crate runs the `typescript.no_async_in_foreach` rule over parsed
//! JavaScript/TypeScript files and can apply its fixes to source text:
//! - `Engine::analyze` returns findings grouped per input context
//! - `Engine::fix_source` rewrites a file until no fix applies
//!
//! # Example
//!
//! ```ignore
//! use loopfix_analysis::Engine;
//!
//! let engine = Engine::with_default_config();
//! let results = engine.analyze(meta, contexts).await?;
//! let outcome = engine.fix_source(&source).await?;
//! ```

pub mod parse;
pub mod semantics;
pub mod types;

pub mod config;
pub mod engine;
pub mod error;
pub mod rules;
pub mod session;
pub mod suppression;

pub use parse::ast::FileId;
pub use semantics::SourceSemantics;
pub use types::context::{Dimension, Language, SessionContextInput, SourceFile};
pub use types::finding::{Finding, FindingKind, Severity};
pub use types::meta::ReviewSessionMeta;
pub use types::session_result::{ContextResult, ReviewSessionResult};

pub use config::EngineConfig;
pub use engine::{Engine, FixOutcome};
pub use error::EngineError;
pub use rules::Rule;
pub use rules::registry::RuleRegistry;
