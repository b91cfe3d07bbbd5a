//! Domain layer: expression trees, span excerpts
//!
//! This layer is independent of external concerns (no file opening, no CLI, no config loading).

pub mod arena;
pub mod error;
pub mod excerpt;
pub mod parser;
pub mod printer;
pub mod rewrite;
pub mod span;

pub use arena::{ExprNode, ExprTree, PLACEHOLDER};
pub use error::{DomainError, DomainResult};
pub use excerpt::{highlight, Excerpt, Markers, DEFAULT_MAX_LINES};
pub use parser::{parse, tokenize, Token, MAX_DEPTH};
pub use printer::Printer;
pub use rewrite::{
    simplify, Rewriter, SubstitutionRule, DEFAULT_CLEAN_PATTERN, DEFAULT_SUBSTITUTIONS,
};
pub use span::{DiagnosticSpan, Position, Severity};
