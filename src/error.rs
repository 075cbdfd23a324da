use std::path::PathBuf;
use thiserror::Error;

/// Every way a tagit run can abort.
#[derive(Debug, Error)]
pub enum TagitError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("File error for '{}': {reason}", path.display())]
    File { path: PathBuf, reason: String },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Git operation failed: {0}")]
    GitOperation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TagitError>;

impl TagitError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TagitError::Validation(msg.into())
    }

    pub fn security(msg: impl Into<String>) -> Self {
        TagitError::Security(msg.into())
    }

    pub fn file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TagitError::File {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn git(msg: impl Into<String>) -> Self {
        TagitError::GitOperation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        TagitError::Config(msg.into())
    }
}
