//! Resource specs and the attributes the control plane reports back.
//!
//! Specs are plain serde structs: what we ask the control plane to
//! materialize. Attrs are what it answers with — the identifying
//! attributes later stages need (ARNs, ids, endpoints). Every create is
//! an upsert keyed by resource name, so redeploys update in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field mapping — the one contract shared by index creation and the
// knowledge base binding. A silent mismatch between the two produces
// retrieval that returns zero results with no error.
// ---------------------------------------------------------------------------

/// Names of the three fields the knowledge base reads from the vector
/// index. Must exactly match the field names used when the index was
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Dense vector field.
    pub vector_field: String,
    /// Indexed text-chunk field.
    pub text_field: String,
    /// Unindexed metadata field.
    pub metadata_field: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            vector_field: "vector-field".to_string(),
            text_field: "AOSS_KB_TEXT_CHUNK".to_string(),
            metadata_field: "AOSS_KB_METADATA".to_string(),
        }
    }
}

impl FieldMapping {
    pub fn with_vector_field(mut self, vector_field: &str) -> Self {
        self.vector_field = vector_field.to_string();
        self
    }
}

// ---------------------------------------------------------------------------
// Runtime layer
// ---------------------------------------------------------------------------

/// Shared runtime dependency bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub description: String,
    /// Runtime the bundle is built for (e.g. "python3.13").
    pub runtime: String,
    pub architecture: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerAttrs {
    pub arn: String,
}

// ---------------------------------------------------------------------------
// Policies and roles
// ---------------------------------------------------------------------------

/// Kind of a collection security policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityPolicyType {
    Encryption,
    Network,
}

/// Encryption or network policy attached to a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityPolicySpec {
    pub name: String,
    pub policy_type: SecurityPolicyType,
    pub document: serde_json::Value,
}

/// Data-access policy granting index/collection permissions to principals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessPolicySpec {
    pub name: String,
    pub document: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyAttrs {
    pub name: String,
}

/// Effect of a policy statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    Allow,
    Deny,
}

/// A single identity-policy statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<serde_json::Value>,
}

impl PolicyStatement {
    pub fn allow(actions: &[&str], resources: &[&str]) -> Self {
        Self {
            effect: Effect::Allow,
            actions: actions.iter().map(|s| s.to_string()).collect(),
            resources: resources.iter().map(|s| s.to_string()).collect(),
            conditions: None,
        }
    }

    pub fn with_conditions(mut self, conditions: serde_json::Value) -> Self {
        self.conditions = Some(conditions);
        self
    }
}

/// Execution role assumed by a managed service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: String,
    /// Service principal allowed to assume the role.
    pub assumed_by: String,
    pub description: String,
    pub statements: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAttrs {
    pub arn: String,
    pub name: String,
}

/// Customer-managed encryption key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyAttrs {
    pub arn: String,
}

// ---------------------------------------------------------------------------
// Vector collection
// ---------------------------------------------------------------------------

/// Collection mode. Only vector search is supported here; plain search
/// and time-series collections are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionType {
    VectorSearch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub name: String,
    pub description: String,
    pub collection_type: CollectionType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionAttrs {
    pub arn: String,
    pub id: String,
    pub name: String,
    /// HTTPS endpoint the index-creation handler talks to.
    pub endpoint: String,
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Placement of a function inside a private network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcPlacement {
    pub vpc_id: String,
    pub security_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub handler: String,
    pub role_arn: String,
    pub environment: BTreeMap<String, String>,
    pub timeout_secs: u64,
    pub memory_mb: u32,
    pub layer_arns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc: Option<VpcPlacement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionAttrs {
    pub arn: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Object storage
// ---------------------------------------------------------------------------

/// Server-access-log destination for a bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketLogging {
    pub bucket_name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketSpec {
    pub name: String,
    pub versioned: bool,
    pub block_public_access: bool,
    pub enforce_ssl: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_logs: Option<BucketLogging>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketAttrs {
    pub arn: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Knowledge base and data source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseSpec {
    pub name: String,
    pub description: String,
    pub role_arn: String,
    pub embedding_model_arn: String,
    pub collection_arn: String,
    pub vector_index_name: String,
    pub field_mapping: FieldMapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseAttrs {
    pub id: String,
    pub arn: String,
}

/// Wire-level chunking configuration attached to a data source.
///
/// Immutable once the data source exists; changing it requires
/// recreating the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkingConfig {
    FixedSize {
        max_tokens: u32,
        overlap_percentage: u32,
    },
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceSpec {
    pub name: String,
    pub description: String,
    pub knowledge_base_id: String,
    pub bucket_arn: String,
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceAttrs {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Networking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcSpec {
    pub name: String,
    pub cidr: String,
    pub max_azs: u32,
    /// CIDR mask of each isolated subnet.
    pub subnet_cidr_mask: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcAttrs {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    pub name: String,
    pub vpc_id: String,
    pub description: String,
    pub allow_all_outbound: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroupAttrs {
    pub id: String,
}

/// Interface endpoint into a managed service from a private network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcEndpointSpec {
    pub name: String,
    pub vpc_id: String,
    /// Service the endpoint fronts (e.g. "bedrock-agent-runtime").
    pub service: String,
    pub security_group_ids: Vec<String>,
    pub private_dns_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcEndpointAttrs {
    pub id: String,
}

// ---------------------------------------------------------------------------
// REST API and usage plan
// ---------------------------------------------------------------------------

/// A single API route fronting the query function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    pub path: String,
    pub method: String,
    pub api_key_required: bool,
    /// JSON-schema document validating the request body, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestApiSpec {
    pub name: String,
    pub description: String,
    pub stage_name: String,
    pub handler_function_arn: String,
    /// Private APIs are reachable only through this endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_endpoint_id: Option<String>,
    pub routes: Vec<RouteSpec>,
    pub cors_preflight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestApiAttrs {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleSettings {
    pub rate_limit: u32,
    pub burst_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaSettings {
    pub limit: u32,
    /// "DAY", "WEEK" or "MONTH".
    pub period: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsagePlanSpec {
    pub name: String,
    pub api_id: String,
    pub stage_name: String,
    pub throttle: ThrottleSettings,
    pub quota: QuotaSettings,
    pub api_key_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsagePlanAttrs {
    pub id: String,
    pub api_key_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_mapping_defaults() {
        let mapping = FieldMapping::default();
        assert_eq!(mapping.vector_field, "vector-field");
        assert_eq!(mapping.text_field, "AOSS_KB_TEXT_CHUNK");
        assert_eq!(mapping.metadata_field, "AOSS_KB_METADATA");
    }

    #[test]
    fn test_chunking_config_wire_format() {
        let fixed = ChunkingConfig::FixedSize {
            max_tokens: 8000,
            overlap_percentage: 20,
        };
        let value = serde_json::to_value(&fixed).unwrap();
        assert_eq!(value["strategy"], "FIXED_SIZE");
        assert_eq!(value["max_tokens"], 8000);

        let none = serde_json::to_value(&ChunkingConfig::None).unwrap();
        assert_eq!(none["strategy"], "NONE");
    }

    #[test]
    fn test_collection_type_wire_format() {
        let value = serde_json::to_value(CollectionType::VectorSearch).unwrap();
        assert_eq!(value, "VECTOR_SEARCH");
    }
}
