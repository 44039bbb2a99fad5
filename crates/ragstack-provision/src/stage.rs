//! Stage identity and the `ProvisionStage` trait.

use std::sync::Arc;

use async_trait::async_trait;
use ragstack_cloud::CloudClient;
use ragstack_registry::{ParamKey, ParameterEntry, ParameterRegistry};
use serde::{Deserialize, Serialize};

use crate::config::DeployConfig;
use crate::error::Result;

/// The four provisioning stages, in deployment order.
///
/// The dependency graph is a linear chain: each stage depends on the
/// previous one, and every value crossing a stage boundary goes through
/// the parameter registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Shared runtime dependency bundle.
    LambdaLayer,
    /// Vector-search collection, its policies, and the one-time index
    /// creation trigger.
    VectorStore,
    /// Knowledge base, execution role, bucket and data source.
    KnowledgeBase,
    /// Private network, query function and rate-limited REST API.
    Api,
}

impl StageName {
    /// Stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::LambdaLayer => "lambda_layer",
            StageName::VectorStore => "vector_store",
            StageName::KnowledgeBase => "knowledge_base",
            StageName::Api => "api",
        }
    }

    /// Stages that must have completed before this one runs.
    pub fn depends_on(&self) -> &'static [StageName] {
        match self {
            StageName::LambdaLayer => &[],
            StageName::VectorStore => &[StageName::LambdaLayer],
            StageName::KnowledgeBase => &[StageName::VectorStore],
            StageName::Api => &[StageName::KnowledgeBase],
        }
    }

    /// Keys this stage publishes into the registry.
    ///
    /// The orchestrator verifies a dependency completed by reading all
    /// of its declared keys, and verifies a finished stage actually
    /// published everything it declares here.
    pub fn publishes(&self) -> &'static [ParamKey] {
        match self {
            StageName::LambdaLayer => &[ParamKey::LambdaLayerArn],
            StageName::VectorStore => &[
                ParamKey::CollectionArn,
                ParamKey::CollectionId,
                ParamKey::CollectionName,
            ],
            StageName::KnowledgeBase => &[
                ParamKey::KnowledgebaseId,
                ParamKey::KnowledgebaseArn,
                ParamKey::DatasourceId,
                ParamKey::DataBucketArn,
            ],
            StageName::Api => &[
                ParamKey::VpcId,
                ParamKey::QueryLambdaArn,
                ParamKey::ApiGateway,
                ParamKey::ApiUsagePlanId,
            ],
        }
    }

    /// All stages in deployment order.
    pub fn all() -> &'static [StageName] {
        &[
            StageName::LambdaLayer,
            StageName::VectorStore,
            StageName::KnowledgeBase,
            StageName::Api,
        ]
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a stage needs to build its resources.
#[derive(Clone)]
pub struct StageContext {
    pub registry: Arc<dyn ParameterRegistry>,
    pub cloud: Arc<dyn CloudClient>,
    pub config: DeployConfig,
}

impl StageContext {
    pub fn new(
        registry: Arc<dyn ParameterRegistry>,
        cloud: Arc<dyn CloudClient>,
        config: DeployConfig,
    ) -> Self {
        Self {
            registry,
            cloud,
            config,
        }
    }
}

/// One provisioning stage.
///
/// `build` creates or updates the stage's resources through the cloud
/// client and returns the entries to publish. It must be idempotent:
/// re-running against an already-deployed environment updates resources
/// in place and returns the same keys with compatible values.
#[async_trait]
pub trait ProvisionStage: Send + Sync {
    /// Which stage this is.
    fn name(&self) -> StageName;

    /// Build the stage's resources and return its registry outputs.
    async fn build(&self, ctx: &StageContext) -> Result<Vec<ParameterEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_dependency_chain() {
        assert!(StageName::LambdaLayer.depends_on().is_empty());
        assert_eq!(StageName::VectorStore.depends_on(), &[StageName::LambdaLayer]);
        assert_eq!(
            StageName::KnowledgeBase.depends_on(),
            &[StageName::VectorStore]
        );
        assert_eq!(StageName::Api.depends_on(), &[StageName::KnowledgeBase]);
    }

    #[test]
    fn test_every_key_is_published_by_exactly_one_stage() {
        let mut published: Vec<ParamKey> = StageName::all()
            .iter()
            .flat_map(|s| s.publishes().iter().copied())
            .collect();
        published.sort_by_key(|k| k.as_str());
        published.dedup();
        assert_eq!(published.len(), ParamKey::all().len());
    }

    #[test]
    fn test_publishes_matches_key_ownership() {
        for stage in StageName::all() {
            for key in stage.publishes() {
                assert_eq!(key.published_by(), stage.as_str());
            }
        }
    }
}
