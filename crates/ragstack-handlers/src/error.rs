//! Handler error types.

use thiserror::Error;

/// Errors raised while running a handler.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Required environment variables are absent. Lists every missing
    /// variable so a misdeployed function fails exactly once with the
    /// full picture.
    #[error("missing environment variables: {}", missing.join(", "))]
    MissingEnv { missing: Vec<String> },

    /// The request body was not the expected shape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The vector index service rejected or dropped a call.
    #[error("vector index operation failed: {0}")]
    VectorIndex(String),

    /// The index never became queryable within the readiness deadline.
    #[error("index '{index}' not ready after {waited_secs}s")]
    IndexNotReady { index: String, waited_secs: u64 },

    /// The generation service failed to answer.
    #[error("generation failed: {0}")]
    Generation(String),
}

pub type Result<T> = std::result::Result<T, HandlerError>;
