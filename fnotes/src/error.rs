//! Error types for the FNotes core
//!
//! All errors use thiserror for structured error handling.
//! Store failures are not expected to be recoverable by the user; callers
//! either propagate them or log and drop them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Note not found: {0}")]
    NoteNotFound(i64),

    #[error("Platform error: {0}")]
    Platform(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
