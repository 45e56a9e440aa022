//! Shared error types.
//!
//! Provides a unified error taxonomy for all services.

use thiserror::Error;

/// Result alias using [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation (empty database or collection name).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Failed to reach or authenticate against the database server.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    /// A database operation was rejected by the server.
    #[error("Database operation error: {0}")]
    DatabaseQuery(String),

    /// The external provision plan file could not be read or parsed.
    #[error("Plan file error: {0}")]
    PlanFile(String),
}
