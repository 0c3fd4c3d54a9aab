//! Error types for shelf-core

use thiserror::Error;

/// Result type alias using shelf-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shelf-core operations
///
/// Network failures are not represented here: they are carried by
/// [`crate::remote::SubmitError`] and [`crate::remote::FetchError`] and are
/// absorbed by the sync engine instead of surfacing to callers.
#[derive(Error, Debug)]
pub enum Error {
    /// Local persistence failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Referenced record does not exist in the local store
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error came from the durable store (disk, schema, corruption).
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Sqlite(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_classification() {
        assert!(Error::Storage("disk full".into()).is_storage());
        assert!(Error::Io(std::io::Error::other("boom")).is_storage());
        assert!(!Error::NotFound("abc".into()).is_storage());
        assert!(!Error::InvalidInput("empty name".into()).is_storage());
    }
}
