//! Error types for the solmi indexer.

use thiserror::Error;

use crate::models::PostId;

/// Result type alias using solmi's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for indexing and storage operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Post not found
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    /// A keyword with the same normalized value already exists
    #[error("Duplicate keyword: {0}")]
    DuplicateKeyword(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One or more indexing branches failed
    #[error("Indexing error: {0}")]
    Indexing(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is a keyword uniqueness conflict.
    pub fn is_duplicate_keyword(&self) -> bool {
        matches!(self, Error::DuplicateKeyword(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
