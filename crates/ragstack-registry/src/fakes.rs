//! In-memory fake for the `ParameterRegistry` trait (testing and dry runs)

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{RegistryError, Result};
use crate::key::ParamKey;
use crate::registry::{ParameterEntry, ParameterRecord, ParameterRegistry};

/// In-memory registry backed by a `Mutex<HashMap>`.
///
/// Satisfies the full trait contract without any external service;
/// used by tests and by `deploy --dry-run`.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: Mutex<HashMap<ParamKey, ParameterRecord>>,
    /// When set, every operation fails with `RegistryUnavailable`.
    unavailable: Mutex<bool>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable backing store.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    fn check_available(&self) -> Result<()> {
        if *self.unavailable.lock().unwrap() {
            return Err(RegistryError::RegistryUnavailable(
                "memory registry marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of published keys (test helper).
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ParameterRegistry for MemoryRegistry {
    async fn publish(&self, entry: ParameterEntry) -> Result<()> {
        self.check_available()?;
        let record = ParameterRecord {
            key: entry.key,
            value: entry.value,
            description: entry.description,
            updated_at: Utc::now(),
        };
        self.entries.lock().unwrap().insert(entry.key, record);
        Ok(())
    }

    async fn read(&self, key: ParamKey) -> Result<String> {
        self.check_available()?;
        self.entries
            .lock()
            .unwrap()
            .get(&key)
            .map(|r| r.value.clone())
            .ok_or_else(|| RegistryError::not_found(key))
    }

    async fn contains(&self, key: ParamKey) -> Result<bool> {
        self.check_available()?;
        Ok(self.entries.lock().unwrap().contains_key(&key))
    }

    async fn describe(&self, key: ParamKey) -> Result<ParameterRecord> {
        self.check_available()?;
        self.entries
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_then_read() {
        let registry = MemoryRegistry::new();
        registry
            .publish(ParameterEntry::new(ParamKey::VpcId, "vpc-123", "VPC ID"))
            .await
            .unwrap();

        assert_eq!(registry.read(ParamKey::VpcId).await.unwrap(), "vpc-123");
    }

    #[tokio::test]
    async fn test_unavailable_never_fails_silently() {
        let registry = MemoryRegistry::new();
        registry.set_unavailable(true);

        let err = registry
            .publish(ParameterEntry::new(ParamKey::VpcId, "vpc-123", "VPC ID"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::RegistryUnavailable(_)));
    }
}
