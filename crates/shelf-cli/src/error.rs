use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] shelf_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Could not resolve a data directory; pass --db-path or set SHELF_DB_PATH")]
    DataDirUnavailable,
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("Image file is empty: {0}")]
    EmptyImage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
