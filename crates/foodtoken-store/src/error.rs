//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// Storage failures are fatal to the current operation and surface to the
/// caller; they are never retried inside the store, since a transparent
/// retry could double-apply a state transition.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value could not be interpreted (corrupt row).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
