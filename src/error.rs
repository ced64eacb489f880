// src/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EcoError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database Error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Editor exited with a non-zero status")]
    EditorError,

    #[error("Entry #{0} not found")]
    EntryNotFound(u64),

    #[error("No changes detected in entry")]
    NoChangesMade,

    #[error("The stored log could not be read; refusing to overwrite it")]
    LogUnreadable,

    #[error("Invalid identity token: {0}")]
    InvalidToken(String),
}

pub type Result<T> = std::result::Result<T, EcoError>;
