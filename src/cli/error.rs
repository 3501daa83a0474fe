//! CLI-level errors (wraps application errors)

use std::io;

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("no attribute named {0:?} matched")]
    NoMatch(String),

    #[error("{failed} of {total} files failed round-trip validation")]
    ValidationFailed { failed: usize, total: usize },
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::Application(e.into())
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::NoMatch(_) | CliError::ValidationFailed { .. } => crate::exitcode::DATAERR,
            CliError::Application(e) => match e {
                ApplicationError::Domain(_) | ApplicationError::Parse(_) => {
                    crate::exitcode::DATAERR
                }
                ApplicationError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                    crate::exitcode::NOINPUT
                }
                ApplicationError::Io { .. } => crate::exitcode::IOERR,
                ApplicationError::MissingPath => crate::exitcode::USAGE,
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
            },
        }
    }
}
