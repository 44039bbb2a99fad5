//! The `CloudClient` trait: everything a stage asks the control plane for.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CloudResult;
use crate::types::*;

/// Control-plane client used by every provisioning stage.
///
/// Guarantees:
/// - Every `create_*`/`put_*` call is an upsert keyed by the resource
///   name: re-running a stage updates the resource in place and returns
///   the same identifying attributes, never a duplicate.
/// - Failures are never silent — an unreachable control plane is
///   `CloudError::Unavailable`, a refused request is
///   `CloudError::Rejected` with the resource kind and name.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Publish the shared runtime dependency bundle.
    async fn create_layer(&self, spec: LayerSpec) -> CloudResult<LayerAttrs>;

    /// Attach an encryption or network policy to a collection name.
    async fn put_security_policy(&self, spec: SecurityPolicySpec) -> CloudResult<PolicyAttrs>;

    /// Attach a data-access policy to a collection name.
    async fn put_access_policy(&self, spec: AccessPolicySpec) -> CloudResult<PolicyAttrs>;

    /// Mint a customer-managed encryption key under the given alias.
    async fn create_key(&self, alias: &str) -> CloudResult<KeyAttrs>;

    /// Create an execution role with its inline policy statements.
    async fn create_role(&self, spec: RoleSpec) -> CloudResult<RoleAttrs>;

    /// Attach one more statement to an existing role.
    ///
    /// Needed when a statement references a resource that only exists
    /// after the role does (the collection-API statement names the
    /// collection id).
    async fn attach_role_statement(
        &self,
        role_name: &str,
        statement: PolicyStatement,
    ) -> CloudResult<()>;

    /// Create the vector-search collection.
    async fn create_collection(&self, spec: CollectionSpec) -> CloudResult<CollectionAttrs>;

    /// Create a function.
    async fn create_function(&self, spec: FunctionSpec) -> CloudResult<FunctionAttrs>;

    /// Invoke a function synchronously (the custom-resource trigger).
    ///
    /// `timeout` is the trigger's own ceiling, distinct from the
    /// function's execution ceiling.
    async fn invoke_function(
        &self,
        function_name: &str,
        payload: Value,
        timeout: Duration,
    ) -> CloudResult<Value>;

    /// Create an object-store bucket.
    async fn create_bucket(&self, spec: BucketSpec) -> CloudResult<BucketAttrs>;

    /// Bind the knowledge base to the collection and embedding model.
    async fn create_knowledge_base(
        &self,
        spec: KnowledgeBaseSpec,
    ) -> CloudResult<KnowledgeBaseAttrs>;

    /// Attach a data source to a knowledge base.
    async fn create_data_source(&self, spec: DataSourceSpec) -> CloudResult<DataSourceAttrs>;

    /// Create a private network.
    async fn create_vpc(&self, spec: VpcSpec) -> CloudResult<VpcAttrs>;

    /// Create a security group inside a network.
    async fn create_security_group(
        &self,
        spec: SecurityGroupSpec,
    ) -> CloudResult<SecurityGroupAttrs>;

    /// Create an interface endpoint into a managed service.
    async fn create_vpc_endpoint(&self, spec: VpcEndpointSpec) -> CloudResult<VpcEndpointAttrs>;

    /// Create the REST API fronting the query function.
    async fn create_rest_api(&self, spec: RestApiSpec) -> CloudResult<RestApiAttrs>;

    /// Create the usage plan (throttle + quota + API key) for an API.
    async fn create_usage_plan(&self, spec: UsagePlanSpec) -> CloudResult<UsagePlanAttrs>;
}
