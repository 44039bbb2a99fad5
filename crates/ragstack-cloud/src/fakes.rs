//! In-memory fake control plane (testing and dry runs)
//!
//! `MemoryCloud` satisfies the full `CloudClient` contract without any
//! external service: every create is an upsert keyed by `(kind, name)`,
//! attributes are derived deterministically from the resource name, and
//! tests can inject failures per resource or intercept function
//! invocations.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::client::CloudClient;
use crate::error::{CloudError, CloudResult};
use crate::types::*;

type InvokeHook = Box<dyn Fn(&str, &Value) -> CloudResult<Value> + Send + Sync>;

/// In-memory control plane.
pub struct MemoryCloud {
    region: String,
    account_id: String,
    partition: String,
    /// Stored specs, keyed by (resource kind, resource name).
    resources: Mutex<HashMap<(&'static str, String), Value>>,
    /// How many times each (kind, name) was created/updated.
    create_counts: Mutex<HashMap<(&'static str, String), u32>>,
    /// Every function invocation, in order.
    invocations: Mutex<Vec<(String, Value)>>,
    /// Resources that should fail on create.
    failures: Mutex<HashMap<(&'static str, String), String>>,
    /// Optional hook answering `invoke_function` calls.
    invoke_hook: Mutex<Option<InvokeHook>>,
}

impl MemoryCloud {
    pub fn new(region: &str, account_id: &str) -> Self {
        let partition = if region.contains("gov") {
            "aws-us-gov"
        } else {
            "aws"
        };
        Self {
            region: region.to_string(),
            account_id: account_id.to_string(),
            partition: partition.to_string(),
            resources: Mutex::new(HashMap::new()),
            create_counts: Mutex::new(HashMap::new()),
            invocations: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            invoke_hook: Mutex::new(None),
        }
    }

    /// Make the next creates of `(kind, name)` fail with `reason`.
    pub fn fail_on(&self, kind: &'static str, name: &str, reason: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert((kind, name.to_string()), reason.to_string());
    }

    /// Answer `invoke_function` calls with the given hook.
    pub fn on_invoke<F>(&self, hook: F)
    where
        F: Fn(&str, &Value) -> CloudResult<Value> + Send + Sync + 'static,
    {
        *self.invoke_hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Stored spec for a resource, if it was created.
    pub fn resource(&self, kind: &'static str, name: &str) -> Option<Value> {
        self.resources
            .lock()
            .unwrap()
            .get(&(kind, name.to_string()))
            .cloned()
    }

    /// How many times a resource was created or updated in place.
    pub fn create_count(&self, kind: &'static str, name: &str) -> u32 {
        self.create_counts
            .lock()
            .unwrap()
            .get(&(kind, name.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Names of all resources of a kind, in no particular order.
    pub fn created(&self, kind: &'static str) -> Vec<String> {
        self.resources
            .lock()
            .unwrap()
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Every function invocation recorded so far.
    pub fn invocations(&self) -> Vec<(String, Value)> {
        self.invocations.lock().unwrap().clone()
    }

    fn record<S: serde::Serialize>(
        &self,
        kind: &'static str,
        name: &str,
        spec: &S,
    ) -> CloudResult<()> {
        if let Some(reason) = self
            .failures
            .lock()
            .unwrap()
            .get(&(kind, name.to_string()))
        {
            return Err(CloudError::Rejected {
                kind,
                name: name.to_string(),
                reason: reason.clone(),
            });
        }
        let value = serde_json::to_value(spec).map_err(|e| CloudError::MalformedResponse {
            kind,
            detail: e.to_string(),
        })?;
        self.resources
            .lock()
            .unwrap()
            .insert((kind, name.to_string()), value);
        *self
            .create_counts
            .lock()
            .unwrap()
            .entry((kind, name.to_string()))
            .or_insert(0) += 1;
        Ok(())
    }

    fn id_for(kind: &str, name: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        hasher.update(b"/");
        hasher.update(name.as_bytes());
        hex::encode(hasher.finalize())[..10].to_string()
    }

    fn arn(&self, service: &str, suffix: &str) -> String {
        format!(
            "arn:{}:{}:{}:{}:{}",
            self.partition, service, self.region, self.account_id, suffix
        )
    }
}

#[async_trait]
impl CloudClient for MemoryCloud {
    async fn create_layer(&self, spec: LayerSpec) -> CloudResult<LayerAttrs> {
        self.record("layer", &spec.name, &spec)?;
        Ok(LayerAttrs {
            arn: self.arn("lambda", &format!("layer:{}:1", spec.name)),
        })
    }

    async fn put_security_policy(&self, spec: SecurityPolicySpec) -> CloudResult<PolicyAttrs> {
        self.record("security_policy", &spec.name, &spec)?;
        Ok(PolicyAttrs { name: spec.name })
    }

    async fn put_access_policy(&self, spec: AccessPolicySpec) -> CloudResult<PolicyAttrs> {
        self.record("access_policy", &spec.name, &spec)?;
        Ok(PolicyAttrs { name: spec.name })
    }

    async fn create_key(&self, alias: &str) -> CloudResult<KeyAttrs> {
        self.record("key", alias, &json!({ "alias": alias }))?;
        Ok(KeyAttrs {
            arn: self.arn("kms", &format!("key/{}", Self::id_for("key", alias))),
        })
    }

    async fn create_role(&self, spec: RoleSpec) -> CloudResult<RoleAttrs> {
        self.record("role", &spec.name, &spec)?;
        Ok(RoleAttrs {
            arn: format!(
                "arn:{}:iam::{}:role/{}",
                self.partition, self.account_id, spec.name
            ),
            name: spec.name,
        })
    }

    async fn attach_role_statement(
        &self,
        role_name: &str,
        statement: PolicyStatement,
    ) -> CloudResult<()> {
        let key = ("role", role_name.to_string());
        let mut resources = self.resources.lock().unwrap();
        let role = resources
            .get_mut(&key)
            .ok_or_else(|| CloudError::Rejected {
                kind: "role",
                name: role_name.to_string(),
                reason: "role does not exist".to_string(),
            })?;
        let statement = serde_json::to_value(&statement).map_err(|e| {
            CloudError::MalformedResponse {
                kind: "role",
                detail: e.to_string(),
            }
        })?;
        role["statements"]
            .as_array_mut()
            .map(|s| s.push(statement));
        Ok(())
    }

    async fn create_collection(&self, spec: CollectionSpec) -> CloudResult<CollectionAttrs> {
        self.record("collection", &spec.name, &spec)?;
        let id = Self::id_for("collection", &spec.name);
        Ok(CollectionAttrs {
            arn: self.arn("aoss", &format!("collection/{id}")),
            endpoint: format!("https://{id}.{}.aoss.example.com", self.region),
            id,
            name: spec.name,
        })
    }

    async fn create_function(&self, spec: FunctionSpec) -> CloudResult<FunctionAttrs> {
        self.record("function", &spec.name, &spec)?;
        Ok(FunctionAttrs {
            arn: self.arn("lambda", &format!("function:{}", spec.name)),
            name: spec.name,
        })
    }

    async fn invoke_function(
        &self,
        function_name: &str,
        payload: Value,
        _timeout: Duration,
    ) -> CloudResult<Value> {
        if self
            .resource("function", function_name)
            .is_none()
        {
            return Err(CloudError::InvocationFailed {
                function: function_name.to_string(),
                reason: "function does not exist".to_string(),
            });
        }
        self.invocations
            .lock()
            .unwrap()
            .push((function_name.to_string(), payload.clone()));
        if let Some(hook) = self.invoke_hook.lock().unwrap().as_ref() {
            return hook(function_name, &payload);
        }
        Ok(json!({ "statusCode": 200 }))
    }

    async fn create_bucket(&self, spec: BucketSpec) -> CloudResult<BucketAttrs> {
        self.record("bucket", &spec.name, &spec)?;
        Ok(BucketAttrs {
            arn: format!("arn:{}:s3:::{}", self.partition, spec.name),
            name: spec.name,
        })
    }

    async fn create_knowledge_base(
        &self,
        spec: KnowledgeBaseSpec,
    ) -> CloudResult<KnowledgeBaseAttrs> {
        self.record("knowledge_base", &spec.name, &spec)?;
        let id = Self::id_for("knowledge_base", &spec.name);
        Ok(KnowledgeBaseAttrs {
            arn: self.arn("bedrock", &format!("knowledge-base/{id}")),
            id,
        })
    }

    async fn create_data_source(&self, spec: DataSourceSpec) -> CloudResult<DataSourceAttrs> {
        self.record("data_source", &spec.name, &spec)?;
        Ok(DataSourceAttrs {
            id: Self::id_for("data_source", &spec.name),
        })
    }

    async fn create_vpc(&self, spec: VpcSpec) -> CloudResult<VpcAttrs> {
        self.record("vpc", &spec.name, &spec)?;
        Ok(VpcAttrs {
            id: format!("vpc-{}", Self::id_for("vpc", &spec.name)),
        })
    }

    async fn create_security_group(
        &self,
        spec: SecurityGroupSpec,
    ) -> CloudResult<SecurityGroupAttrs> {
        self.record("security_group", &spec.name, &spec)?;
        Ok(SecurityGroupAttrs {
            id: format!("sg-{}", Self::id_for("security_group", &spec.name)),
        })
    }

    async fn create_vpc_endpoint(&self, spec: VpcEndpointSpec) -> CloudResult<VpcEndpointAttrs> {
        self.record("vpc_endpoint", &spec.name, &spec)?;
        Ok(VpcEndpointAttrs {
            id: format!("vpce-{}", Self::id_for("vpc_endpoint", &spec.name)),
        })
    }

    async fn create_rest_api(&self, spec: RestApiSpec) -> CloudResult<RestApiAttrs> {
        self.record("rest_api", &spec.name, &spec)?;
        Ok(RestApiAttrs {
            id: Self::id_for("rest_api", &spec.name),
        })
    }

    async fn create_usage_plan(&self, spec: UsagePlanSpec) -> CloudResult<UsagePlanAttrs> {
        self.record("usage_plan", &spec.name, &spec)?;
        Ok(UsagePlanAttrs {
            id: Self::id_for("usage_plan", &spec.name),
            api_key_id: Self::id_for("api_key", &spec.api_key_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_is_upsert() {
        let cloud = MemoryCloud::new("us-east-1", "111122223333");
        let spec = CollectionSpec {
            name: "demo-collection".to_string(),
            description: "test".to_string(),
            collection_type: CollectionType::VectorSearch,
        };

        let first = cloud.create_collection(spec.clone()).await.unwrap();
        let second = cloud.create_collection(spec).await.unwrap();

        assert_eq!(first.arn, second.arn);
        assert_eq!(first.id, second.id);
        assert_eq!(cloud.created("collection").len(), 1);
        assert_eq!(cloud.create_count("collection", "demo-collection"), 2);
    }

    #[tokio::test]
    async fn test_gov_region_partition() {
        let cloud = MemoryCloud::new("us-gov-west-1", "111122223333");
        let attrs = cloud
            .create_collection(CollectionSpec {
                name: "c".to_string(),
                description: String::new(),
                collection_type: CollectionType::VectorSearch,
            })
            .await
            .unwrap();
        assert!(attrs.arn.starts_with("arn:aws-us-gov:aoss:"));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let cloud = MemoryCloud::new("us-east-1", "111122223333");
        cloud.fail_on("vpc", "demo-vpc", "cidr exhausted");

        let err = cloud
            .create_vpc(VpcSpec {
                name: "demo-vpc".to_string(),
                cidr: "10.1.1.0/26".to_string(),
                max_azs: 2,
                subnet_cidr_mask: 28,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Rejected { kind: "vpc", .. }));
    }

    #[tokio::test]
    async fn test_invoke_requires_existing_function() {
        let cloud = MemoryCloud::new("us-east-1", "111122223333");
        let err = cloud
            .invoke_function("ghost", json!({}), Duration::from_secs(120))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::InvocationFailed { .. }));
    }
}
