//! Error types for bazaar-core

use thiserror::Error;

use crate::pocketbase::ApiError;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the core.
///
/// Only local storage and input problems reach callers of the favorites
/// service; `Remote` is returned by the record client and auth layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Favorites store error: {0}")]
    Database(String),

    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected before touching storage or the backend
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record API error: {0}")]
    Remote(#[from] ApiError),
}
