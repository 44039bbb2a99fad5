//! Deploy configuration.
//!
//! One explicit struct, passed by value into each stage's context — no
//! ambient global settings. Loadable from `ragstack.toml`; validation
//! collects every problem before failing so a broken config fails the
//! deploy exactly once, with the full list.

use ragstack_cloud::{ChunkingConfig, FieldMapping};
use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, Result};

/// How source documents are split into retrievable segments.
///
/// Selected once at configuration time; immutable for the lifetime of
/// the data source. Changing it means recreating the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ChunkingPolicy {
    /// Fixed-size chunking with platform defaults (300 tokens, 20%).
    Default,
    /// Fixed-size chunking with explicit parameters.
    FixedSize {
        max_tokens: u32,
        overlap_percentage: u32,
    },
    /// No chunking; documents are ingested whole.
    None,
}

impl ChunkingPolicy {
    /// Resolve to the wire-level chunking configuration.
    pub fn to_wire(&self) -> ChunkingConfig {
        match self {
            ChunkingPolicy::Default => ChunkingConfig::FixedSize {
                max_tokens: 300,
                overlap_percentage: 20,
            },
            ChunkingPolicy::FixedSize {
                max_tokens,
                overlap_percentage,
            } => ChunkingConfig::FixedSize {
                max_tokens: *max_tokens,
                overlap_percentage: *overlap_percentage,
            },
            ChunkingPolicy::None => ChunkingConfig::None,
        }
    }
}

/// Where the collection's encryption key comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EncryptionKeySource {
    /// Platform-owned key.
    PlatformManaged,
    /// Newly minted customer key under the given alias.
    CustomerManaged { alias: String },
}

/// Network exposure of the collection. The two choices are mutually
/// exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum NetworkAccess {
    /// Reachable from the public internet (dashboards still require
    /// identity integration to actually get in).
    Public,
    /// Reachable only through the named private network endpoint.
    VpcEndpoint { endpoint_id: String },
}

/// Usage-quota accounting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPeriod {
    Day,
    Week,
    Month,
}

impl QuotaPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaPeriod::Day => "DAY",
            QuotaPeriod::Week => "WEEK",
            QuotaPeriod::Month => "MONTH",
        }
    }
}

/// Vector-store stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Name of the dense vector field in the index.
    pub vector_field_name: String,
    pub encryption: EncryptionKeySource,
    pub network: NetworkAccess,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            vector_field_name: "vector-field".to_string(),
            encryption: EncryptionKeySource::PlatformManaged,
            network: NetworkAccess::Public,
        }
    }
}

/// Knowledge-base stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Embedding model identifier.
    pub embedding_model_id: String,
    /// Generation model identifier used by the query handler.
    pub query_model_id: String,
    pub chunking: ChunkingPolicy,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            embedding_model_id: "amazon.titan-embed-text-v2:0".to_string(),
            query_model_id: "amazon.nova-micro-v1:0".to_string(),
            chunking: ChunkingPolicy::FixedSize {
                max_tokens: 8000,
                overlap_percentage: 20,
            },
        }
    }
}

/// Data-source configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Existing bucket holding the source documents. When absent a
    /// fresh bucket (plus a logs bucket) is provisioned.
    pub bucket_name: Option<String>,
}

/// API stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub stage_name: String,
    pub throttle_rate_limit: u32,
    pub throttle_burst_limit: u32,
    pub quota_limit: u32,
    pub quota_period: QuotaPeriod,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            stage_name: "dev".to_string(),
            throttle_rate_limit: 100,
            throttle_burst_limit: 100,
            quota_limit: 1000,
            quota_period: QuotaPeriod::Day,
        }
    }
}

/// Complete configuration of one deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Project name; prefixes every resource name. Max 12 characters.
    pub project: String,
    pub region: String,
    pub account_id: String,
    pub vpc_cidr: String,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub data_source: DataSourceConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            project: "chatbotdemo".to_string(),
            region: "us-east-1".to_string(),
            account_id: String::new(),
            vpc_cidr: "10.1.1.0/26".to_string(),
            vector_store: VectorStoreConfig::default(),
            knowledge_base: KnowledgeBaseConfig::default(),
            data_source: DataSourceConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl DeployConfig {
    /// Parse a config from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: DeployConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file and validate it.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Validate the configuration, collecting every problem.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.project.is_empty() {
            problems.push("project name is empty".to_string());
        }
        if self.project.len() > 12 {
            problems.push(format!(
                "project name '{}' exceeds 12 characters",
                self.project
            ));
        }
        if self.region.is_empty() {
            problems.push("region is empty".to_string());
        }
        if self.account_id.is_empty() {
            problems.push("account_id is empty".to_string());
        }
        if self.vector_store.vector_field_name.is_empty() {
            problems.push("vector_store.vector_field_name is empty".to_string());
        }
        if let ChunkingPolicy::FixedSize {
            max_tokens,
            overlap_percentage,
        } = &self.knowledge_base.chunking
        {
            if *max_tokens == 0 {
                problems.push("chunking max_tokens must be positive".to_string());
            }
            if *overlap_percentage >= 100 {
                problems.push("chunking overlap_percentage must be below 100".to_string());
            }
        }
        if self.api.throttle_rate_limit == 0 {
            problems.push("api.throttle_rate_limit must be positive".to_string());
        }
        if self.api.quota_limit == 0 {
            problems.push("api.quota_limit must be positive".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ProvisionError::InvalidConfig { problems })
        }
    }

    /// ARN partition of the target region.
    pub fn partition(&self) -> &'static str {
        if self.region.contains("gov") {
            "aws-us-gov"
        } else {
            "aws"
        }
    }

    /// ARN of the account root principal.
    pub fn account_root_arn(&self) -> String {
        format!("arn:{}:iam::{}:root", self.partition(), self.account_id)
    }

    /// Fully qualified ARN of a foundation model in this region.
    pub fn foundation_model_arn(&self, model_id: &str) -> String {
        format!(
            "arn:{}:bedrock:{}::foundation-model/{}",
            self.partition(),
            self.region,
            model_id
        )
    }

    // Derived resource names. All prefixed by the project so several
    // deployments can share an account.

    pub fn collection_name(&self) -> String {
        format!("{}-collection", self.project)
    }

    pub fn index_name(&self) -> String {
        format!("{}-kb-index", self.project)
    }

    pub fn kb_name(&self) -> String {
        format!("{}-kb", self.project)
    }

    pub fn api_name(&self) -> String {
        format!("{}-api", self.project)
    }

    pub fn api_key_name(&self) -> String {
        format!("{}-api-key", self.project)
    }

    /// Field mapping shared by index creation and the knowledge base.
    pub fn field_mapping(&self) -> FieldMapping {
        FieldMapping::default().with_vector_field(&self.vector_store.vector_field_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> DeployConfig {
        DeployConfig {
            account_id: "111122223333".to_string(),
            ..DeployConfig::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        valid_config().validate().unwrap();
    }

    #[test]
    fn test_validation_collects_all_problems() {
        let config = DeployConfig {
            project: "a-project-name-way-too-long".to_string(),
            account_id: String::new(),
            ..DeployConfig::default()
        };
        let err = config.validate().unwrap_err();
        match err {
            ProvisionError::InvalidConfig { problems } => {
                assert_eq!(problems.len(), 2);
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_partition_for_gov_region() {
        let mut config = valid_config();
        config.region = "us-gov-west-1".to_string();
        assert_eq!(config.partition(), "aws-us-gov");
        assert_eq!(valid_config().partition(), "aws");
    }

    #[test]
    fn test_derived_names() {
        let config = valid_config();
        assert_eq!(config.collection_name(), "chatbotdemo-collection");
        assert_eq!(config.index_name(), "chatbotdemo-kb-index");
        assert_eq!(config.kb_name(), "chatbotdemo-kb");
        assert_eq!(config.api_name(), "chatbotdemo-api");
    }

    #[test]
    fn test_default_chunking_resolves_to_platform_defaults() {
        let wire = ChunkingPolicy::Default.to_wire();
        assert_eq!(
            wire,
            ChunkingConfig::FixedSize {
                max_tokens: 300,
                overlap_percentage: 20
            }
        );
    }

    #[test]
    fn test_from_toml() {
        let config = DeployConfig::from_toml_str(
            r#"
            project = "demo"
            region = "us-east-1"
            account_id = "111122223333"
            vpc_cidr = "10.1.1.0/26"

            [knowledge_base]
            embedding_model_id = "amazon.titan-embed-text-v2:0"
            query_model_id = "amazon.nova-micro-v1:0"

            [knowledge_base.chunking]
            strategy = "fixed_size"
            max_tokens = 8000
            overlap_percentage = 20

            [vector_store]
            vector_field_name = "vector-field"

            [vector_store.encryption]
            source = "platform_managed"

            [vector_store.network]
            access = "public"
            "#,
        )
        .unwrap();
        assert_eq!(config.project, "demo");
        assert_eq!(
            config.knowledge_base.chunking,
            ChunkingPolicy::FixedSize {
                max_tokens: 8000,
                overlap_percentage: 20
            }
        );
    }
}
