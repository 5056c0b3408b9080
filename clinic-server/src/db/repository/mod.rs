//! Repository Module
//!
//! Free async functions over the SQLite pool, one module per table group.
//! All writes go through here so the workflow layer never touches SQL.

// Auth
pub mod user;

// Facial simulation domain
pub mod face_image;
pub mod simulation;
pub mod skin_analysis;

// Brand material domain
pub mod poster;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
