//! Common error types for the stash crates

use thiserror::Error;

/// Common result type for stash operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the stash crates
#[derive(Error, Debug)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("invalid {algorithm} fingerprint: {hash:?}")]
    BadFingerprint {
        algorithm: &'static str,
        hash: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
