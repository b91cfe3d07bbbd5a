//! CLI-level errors (wraps infrastructure errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    /// The compiler output file given on the command line cannot be opened.
    #[error("cannot open {}", .path.display())]
    NoInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The formatted compiler output contained errors.
    #[error("compiler reported {0} error(s)")]
    CompilerErrors(usize),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NoInput { .. } => crate::exitcode::NOINPUT,
            CliError::CompilerErrors(_) => crate::exitcode::FAILURE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::Domain(DomainError::InvalidPattern { .. }) => {
                        crate::exitcode::CONFIG
                    }
                    ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                    ApplicationError::SourceUnavailable { .. } => crate::exitcode::NOINPUT,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_config_error_when_mapping_then_config_exit_code() {
        let err: CliError = ApplicationError::Config {
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), crate::exitcode::CONFIG);
    }

    #[test]
    fn given_format_error_when_mapping_then_dataerr() {
        let err: CliError =
            ApplicationError::Domain(DomainError::UnbalancedGroup { position: 3 }).into();
        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);
    }

    #[test]
    fn given_compiler_errors_when_mapping_then_failure() {
        assert_eq!(CliError::CompilerErrors(2).exit_code(), 1);
    }

    #[test]
    fn given_unopenable_input_when_mapping_then_noinput() {
        let err = CliError::NoInput {
            path: PathBuf::from("out.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.exit_code(), crate::exitcode::NOINPUT);
        assert_eq!(err.to_string(), "cannot open out.txt");
    }
}
