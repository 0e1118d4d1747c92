//! Error Types

use thiserror::Error;

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Catalog error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Item failed the catalog invariants
    #[error("Invalid media item: {0}")]
    InvalidItem(String),

    /// Item not present in the catalog
    #[error("Media not found: {0}")]
    NotFound(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::Storage(err.to_string())
    }
}
