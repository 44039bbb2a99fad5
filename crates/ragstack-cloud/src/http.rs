//! HTTP control-plane client.
//!
//! Resources are upserted with `PUT {base}/v1/{kind}/{name}`; the
//! control plane answers with the resource's identifying attributes.
//! Function invocations go through
//! `POST {base}/v1/functions/{name}/invocations`.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::CloudClient;
use crate::error::{CloudError, CloudResult};
use crate::types::*;

/// Configuration for the HTTP control-plane client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlPlaneConfig {
    /// Base URL of the control plane.
    pub base_url: String,
    /// Bearer token (optional for unauthenticated control planes).
    pub token: Option<String>,
}

impl ControlPlaneConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// `CloudClient` implementation backed by the control-plane REST API.
pub struct HttpCloudClient {
    config: ControlPlaneConfig,
    http_client: reqwest::Client,
}

impl HttpCloudClient {
    pub fn new(config: ControlPlaneConfig) -> CloudResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("ragstack-cloud/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CloudError::Unavailable(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn upsert<S, A>(&self, kind: &'static str, name: &str, spec: &S) -> CloudResult<A>
    where
        S: Serialize + Sync,
        A: DeserializeOwned,
    {
        debug!(kind, name, "upserting resource");
        let url = format!("{}/v1/{}/{}", self.config.base_url, kind, name);
        let response = self
            .authorize(self.http_client.put(&url))
            .json(spec)
            .send()
            .await
            .map_err(|e| CloudError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(CloudError::Rejected {
                kind,
                name: name.to_string(),
                reason,
            });
        }
        response
            .json::<A>()
            .await
            .map_err(|e| CloudError::MalformedResponse {
                kind,
                detail: e.to_string(),
            })
    }
}

#[async_trait]
impl CloudClient for HttpCloudClient {
    async fn create_layer(&self, spec: LayerSpec) -> CloudResult<LayerAttrs> {
        self.upsert("layers", &spec.name, &spec).await
    }

    async fn put_security_policy(&self, spec: SecurityPolicySpec) -> CloudResult<PolicyAttrs> {
        self.upsert("security-policies", &spec.name, &spec)
            .await
    }

    async fn put_access_policy(&self, spec: AccessPolicySpec) -> CloudResult<PolicyAttrs> {
        self.upsert("access-policies", &spec.name, &spec)
            .await
    }

    async fn create_key(&self, alias: &str) -> CloudResult<KeyAttrs> {
        self.upsert("keys", alias, &serde_json::json!({ "alias": alias }))
            .await
    }

    async fn create_role(&self, spec: RoleSpec) -> CloudResult<RoleAttrs> {
        self.upsert("roles", &spec.name, &spec).await
    }

    async fn attach_role_statement(
        &self,
        role_name: &str,
        statement: PolicyStatement,
    ) -> CloudResult<()> {
        let url = format!(
            "{}/v1/roles/{}/statements",
            self.config.base_url, role_name
        );
        self.authorize(self.http_client.post(&url))
            .json(&statement)
            .send()
            .await
            .map_err(|e| CloudError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| CloudError::Rejected {
                kind: "role",
                name: role_name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn create_collection(&self, spec: CollectionSpec) -> CloudResult<CollectionAttrs> {
        self.upsert("collections", &spec.name, &spec).await
    }

    async fn create_function(&self, spec: FunctionSpec) -> CloudResult<FunctionAttrs> {
        self.upsert("functions", &spec.name, &spec).await
    }

    async fn invoke_function(
        &self,
        function_name: &str,
        payload: Value,
        timeout: Duration,
    ) -> CloudResult<Value> {
        let url = format!(
            "{}/v1/functions/{}/invocations",
            self.config.base_url, function_name
        );
        let response = self
            .authorize(self.http_client.post(&url))
            .timeout(timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CloudError::InvocationFailed {
                function: function_name.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(CloudError::InvocationFailed {
                function: function_name.to_string(),
                reason,
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| CloudError::MalformedResponse {
                kind: "invocation",
                detail: e.to_string(),
            })
    }

    async fn create_bucket(&self, spec: BucketSpec) -> CloudResult<BucketAttrs> {
        self.upsert("buckets", &spec.name, &spec).await
    }

    async fn create_knowledge_base(
        &self,
        spec: KnowledgeBaseSpec,
    ) -> CloudResult<KnowledgeBaseAttrs> {
        self.upsert("knowledge-bases", &spec.name, &spec)
            .await
    }

    async fn create_data_source(&self, spec: DataSourceSpec) -> CloudResult<DataSourceAttrs> {
        self.upsert("data-sources", &spec.name, &spec).await
    }

    async fn create_vpc(&self, spec: VpcSpec) -> CloudResult<VpcAttrs> {
        self.upsert("vpcs", &spec.name, &spec).await
    }

    async fn create_security_group(
        &self,
        spec: SecurityGroupSpec,
    ) -> CloudResult<SecurityGroupAttrs> {
        self.upsert("security-groups", &spec.name, &spec)
            .await
    }

    async fn create_vpc_endpoint(&self, spec: VpcEndpointSpec) -> CloudResult<VpcEndpointAttrs> {
        self.upsert("vpc-endpoints", &spec.name, &spec)
            .await
    }

    async fn create_rest_api(&self, spec: RestApiSpec) -> CloudResult<RestApiAttrs> {
        self.upsert("rest-apis", &spec.name, &spec).await
    }

    async fn create_usage_plan(&self, spec: UsagePlanSpec) -> CloudResult<UsagePlanAttrs> {
        self.upsert("usage-plans", &spec.name, &spec).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = ControlPlaneConfig::new("https://cp.example.com/");
        assert_eq!(config.base_url, "https://cp.example.com");
    }
}
