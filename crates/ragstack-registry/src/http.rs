//! HTTP-backed parameter store client.
//!
//! Talks to the managed parameter service over a small JSON API:
//! `PUT {base}/{namespace}/{key}` stores a value, `GET` reads it back.
//! Keys live under a single flat namespace (default `serverlessrag`) so
//! independently deployed stages resolve each other's outputs by name.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::key::ParamKey;
use crate::registry::{ParameterEntry, ParameterRecord, ParameterRegistry};

/// Configuration for the HTTP parameter store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterStoreConfig {
    /// Base URL of the parameter service.
    pub base_url: String,
    /// Flat namespace all keys are stored under.
    pub namespace: String,
    /// Bearer token (optional for unauthenticated endpoints).
    pub token: Option<String>,
}

impl ParameterStoreConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace: "serverlessrag".to_string(),
            token: None,
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

#[derive(Debug, Serialize)]
struct PutParameterBody<'a> {
    value: &'a str,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct GetParameterBody {
    value: String,
    #[serde(default)]
    description: String,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
}

/// `ParameterRegistry` implementation backed by the parameter service.
pub struct HttpParameterStore {
    config: ParameterStoreConfig,
    http_client: reqwest::Client,
}

impl HttpParameterStore {
    pub fn new(config: ParameterStoreConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("ragstack-registry/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::RegistryUnavailable(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn url_for(&self, key: ParamKey) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url, self.config.namespace, key
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn fetch(&self, key: ParamKey) -> Result<GetParameterBody> {
        let response = self
            .authorize(self.http_client.get(self.url_for(key)))
            .send()
            .await
            .map_err(|e| RegistryError::RegistryUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::not_found(key));
        }
        let response = response
            .error_for_status()
            .map_err(|e| RegistryError::RegistryUnavailable(e.to_string()))?;

        response
            .json::<GetParameterBody>()
            .await
            .map_err(|e| RegistryError::MalformedResponse {
                key,
                detail: e.to_string(),
            })
    }
}

#[async_trait]
impl ParameterRegistry for HttpParameterStore {
    async fn publish(&self, entry: ParameterEntry) -> Result<()> {
        debug!(key = %entry.key, "publishing parameter");
        let body = PutParameterBody {
            value: &entry.value,
            description: &entry.description,
        };
        self.authorize(self.http_client.put(self.url_for(entry.key)))
            .json(&body)
            .send()
            .await
            .map_err(|e| RegistryError::RegistryUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| RegistryError::RegistryUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn read(&self, key: ParamKey) -> Result<String> {
        Ok(self.fetch(key).await?.value)
    }

    async fn contains(&self, key: ParamKey) -> Result<bool> {
        match self.fetch(key).await {
            Ok(_) => Ok(true),
            Err(RegistryError::KeyNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn describe(&self, key: ParamKey) -> Result<ParameterRecord> {
        let body = self.fetch(key).await?;
        Ok(ParameterRecord {
            key,
            value: body.value,
            description: body.description,
            updated_at: body.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ParameterStoreConfig::new("https://params.example.com/");
        assert_eq!(config.base_url, "https://params.example.com");
        assert_eq!(config.namespace, "serverlessrag");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_url_layout() {
        let store = HttpParameterStore::new(ParameterStoreConfig::new("https://params.example.com"))
            .unwrap();
        assert_eq!(
            store.url_for(ParamKey::CollectionArn),
            "https://params.example.com/serverlessrag/collectionArn"
        );
    }
}
