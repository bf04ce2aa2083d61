//! Error types for sopdesk

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SopdeskError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Credential error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<diesel::result::Error> for SopdeskError {
    fn from(e: diesel::result::Error) -> Self {
        SopdeskError::Database(e.to_string())
    }
}

impl SopdeskError {
    /// True when the error is the unique-constraint race on first-touch
    /// progress creation. The progress tracker recovers from this locally;
    /// every other kind propagates unchanged.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SopdeskError::Conflict(_))
    }
}
