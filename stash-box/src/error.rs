//! Stash-box client errors

use thiserror::Error;

/// Result type for stash-box operations
pub type Result<T> = std::result::Result<T, StashBoxError>;

/// Errors surfaced by the stash-box client and the identification pipeline
#[derive(Debug, Error)]
pub enum StashBoxError {
    /// Transport-level failure talking to the registry
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The registry answered with a non-success HTTP status
    #[error("stash-box returned {status}: {body}")]
    Remote { status: u16, body: String },

    /// The registry answered 200 but reported a GraphQL error
    #[error("graphql error: {0}")]
    GraphQl(String),

    /// The registry's response did not match the expected schema
    #[error("malformed stash-box response: {0}")]
    MalformedResponse(String),

    /// Failed to encode a request payload
    #[error("encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// The caller's cancellation token fired
    #[error("operation cancelled")]
    Cancelled,

    /// Local store or model error
    #[error(transparent)]
    Common(#[from] stash_common::Error),
}
