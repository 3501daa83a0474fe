//! Application-level errors (wraps domain errors)

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::DomainError;

/// Malformed document text.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("error when parsing {}: {reason}", source_name(.path.as_deref()))]
pub struct ParseError {
    /// File the text was read from, None for in-memory documents
    pub path: Option<PathBuf>,
    pub reason: String,
}

impl ParseError {
    pub fn new(path: Option<&Path>, reason: impl Into<String>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            reason: reason.into(),
        }
    }
}

fn source_name(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "supplied document".to_string(),
    }
}

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("document has no path to write to")]
    MissingPath,

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
