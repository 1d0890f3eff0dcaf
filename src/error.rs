//! Crate-wide error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NpError>;

#[derive(Debug, Error)]
pub enum NpError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The preference store or a cache could not be written. Future ranking
    /// and learning can no longer be trusted, so this is never swallowed.
    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("collaborator unavailable: {0}")]
    Collaborator(String),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

impl NpError {
    /// Stable machine-readable code used by robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io_error",
            Self::Json(_) | Self::Serialization(_) => "serialization_error",
            Self::Database(_) | Self::Persistence(_) => "persistence_failed",
            Self::Config(_) | Self::MissingConfig(_) => "config_error",
            Self::Collaborator(_) => "collaborator_unavailable",
            Self::ItemNotFound(_) => "item_not_found",
            Self::ValidationFailed(_) => "validation_failed",
        }
    }
}
