//! Error types for ragstack-registry

use crate::key::ParamKey;
use thiserror::Error;

/// Errors that can occur when publishing or reading parameters.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The backing parameter service could not be reached.
    #[error("parameter registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// A key was read before its publishing stage ran.
    ///
    /// This is the dominant integration failure in the whole system
    /// (stage ordering violated, or the upstream stage was never
    /// deployed), so the error names both the key and the stage that
    /// should have published it.
    #[error("key '{key}' not found in registry; it is published by the '{publishing_stage}' stage — deploy that stage first")]
    KeyNotFound {
        key: ParamKey,
        publishing_stage: &'static str,
    },

    /// The parameter service answered with a malformed payload.
    #[error("malformed registry response for key '{key}': {detail}")]
    MalformedResponse { key: ParamKey, detail: String },
}

impl RegistryError {
    /// Build the canonical missing-key error for `key`.
    pub fn not_found(key: ParamKey) -> Self {
        RegistryError::KeyNotFound {
            key,
            publishing_stage: key.published_by(),
        }
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
