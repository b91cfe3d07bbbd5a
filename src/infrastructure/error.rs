//! Errors raised while wiring services to the running process

use thiserror::Error;

use crate::application::ApplicationError;

/// Service construction failures plus process-level I/O such as resolving
/// the working directory used as the source root.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("cannot {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl InfraError {
    /// `context` reads as a verb phrase: "cannot {context}".
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type InfraResult<T> = Result<T, InfraError>;
