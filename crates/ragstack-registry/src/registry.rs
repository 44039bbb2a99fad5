//! The `ParameterRegistry` trait and its entry types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::key::ParamKey;

/// A value to publish into the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterEntry {
    /// Typed key the value is published under.
    pub key: ParamKey,
    /// The published value (resource ARN, id or name).
    pub value: String,
    /// Human-readable description, stored alongside the value.
    pub description: String,
}

impl ParameterEntry {
    pub fn new(key: ParamKey, value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
            description: description.into(),
        }
    }
}

/// A stored parameter as the registry reports it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub key: ParamKey,
    pub value: String,
    pub description: String,
    /// When the value was last written (overwrites bump this).
    pub updated_at: DateTime<Utc>,
}

/// Shared key-value registry that decouples provisioning stages.
///
/// Guarantees:
/// - `publish` durably stores the mapping and overwrites on conflict;
///   it never fails silently — an unreachable backing store is
///   `RegistryError::RegistryUnavailable`.
/// - `read` of a never-published key is `RegistryError::KeyNotFound`,
///   naming the stage that should have published it.
/// - Entries are never deleted by the registry itself; their lifetime
///   is tied to environment teardown.
#[async_trait]
pub trait ParameterRegistry: Send + Sync {
    /// Durably store an entry, overwriting any previous value.
    async fn publish(&self, entry: ParameterEntry) -> Result<()>;

    /// Read a previously published value.
    async fn read(&self, key: ParamKey) -> Result<String>;

    /// Whether a key has ever been published.
    async fn contains(&self, key: ParamKey) -> Result<bool>;

    /// Full record for a key, including its update timestamp.
    async fn describe(&self, key: ParamKey) -> Result<ParameterRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_construction() {
        let entry = ParameterEntry::new(ParamKey::CollectionArn, "arn:aws:aoss:...", "Collection Arn");
        assert_eq!(entry.key, ParamKey::CollectionArn);
        assert_eq!(entry.description, "Collection Arn");
    }
}
