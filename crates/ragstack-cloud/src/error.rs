//! Error types for ragstack-cloud

use thiserror::Error;

/// Errors returned by the control plane.
#[derive(Error, Debug)]
pub enum CloudError {
    /// The control plane could not be reached.
    #[error("control plane unavailable: {0}")]
    Unavailable(String),

    /// The control plane rejected a resource request.
    #[error("{kind} '{name}' rejected by control plane: {reason}")]
    Rejected {
        kind: &'static str,
        name: String,
        reason: String,
    },

    /// A function invocation failed.
    #[error("invocation of function '{function}' failed: {reason}")]
    InvocationFailed { function: String, reason: String },

    /// The control plane answered with a payload we could not decode.
    #[error("malformed control-plane response for {kind}: {detail}")]
    MalformedResponse { kind: &'static str, detail: String },
}

/// Result type for control-plane operations
pub type CloudResult<T> = std::result::Result<T, CloudError>;
