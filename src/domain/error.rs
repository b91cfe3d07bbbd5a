//! Domain-level errors (no I/O concerns)

use thiserror::Error;

/// Domain errors represent malformed compiler notation or rule definitions.
/// They are per-expression and never abort a formatting pass.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("unbalanced ')' at token {position}")]
    UnbalancedGroup { position: usize },

    #[error("expression nested deeper than {depth} levels")]
    TooDeep { depth: usize },

    #[error("malformed application node: {reason}")]
    MalformedApplication { reason: String },

    #[error("malformed variable node: {reason}")]
    MalformedVariable { reason: String },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
