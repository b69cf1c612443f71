//! Unified error types for the wayside cache engine.

use tokio_rusqlite::rusqlite;

/// Unified error types for the cache store and registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("cache store error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("cache store error: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored snapshot could not be decoded back into a response.
    #[error("corrupt snapshot for key {key}: {reason}")]
    CorruptSnapshot { key: String, reason: String },

    /// Invalid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Unknown namespace role string.
    #[error("unknown namespace role: {0}")]
    UnknownRole(String),

    /// Unknown resource kind string.
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
