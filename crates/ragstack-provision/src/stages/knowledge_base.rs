//! Knowledge-base stage: execution role, source bucket, knowledge base
//! and data source.
//!
//! The field mapping handed to the knowledge base must exactly match
//! the field names the index was created with; a silent mismatch yields
//! zero-result retrieval with no error anywhere.

use async_trait::async_trait;
use sha2::{Digest, Sha384};

use ragstack_cloud::{
    policy, AccessPolicySpec, BucketLogging, BucketSpec, DataSourceSpec, KnowledgeBaseSpec,
    PolicyStatement, RoleSpec,
};
use ragstack_registry::{ParamKey, ParameterEntry};

use crate::stage::{ProvisionStage, StageContext, StageName};

/// Binds the managed knowledge base to the vector collection and
/// attaches the object-store data source.
pub struct KnowledgeBaseStage;

impl KnowledgeBaseStage {
    /// Resolve the source bucket.
    ///
    /// An externally supplied bucket is referenced, never created — its
    /// actual accessibility is only validated asynchronously at
    /// ingestion time. Without one, a fresh bucket (plus a logs bucket)
    /// is provisioned under a name derived from account and region, so
    /// redeploys land on the same bucket.
    async fn resolve_bucket_arn(&self, ctx: &StageContext) -> crate::error::Result<String> {
        let config = &ctx.config;
        if let Some(bucket) = &config.data_source.bucket_name {
            if !bucket.is_empty() {
                return Ok(format!("arn:{}:s3:::{}", config.partition(), bucket));
            }
        }

        let mut hasher = Sha384::new();
        hasher.update(config.account_id.as_bytes());
        hasher.update(config.region.as_bytes());
        let suffix = hex::encode(hasher.finalize());

        let logs_bucket = ctx
            .cloud
            .create_bucket(BucketSpec {
                name: format!("{}-logs-{}", config.project, &suffix[..10]).to_lowercase(),
                versioned: false,
                block_public_access: true,
                enforce_ssl: true,
                access_logs: None,
            })
            .await?;

        let data_bucket = ctx
            .cloud
            .create_bucket(BucketSpec {
                name: format!("{}{}", config.project, &suffix[..15]).to_lowercase(),
                versioned: false,
                block_public_access: true,
                enforce_ssl: true,
                access_logs: Some(BucketLogging {
                    bucket_name: logs_bucket.name,
                    prefix: "kb-bucket-logs/".to_string(),
                }),
            })
            .await?;

        Ok(data_bucket.arn)
    }
}

#[async_trait]
impl ProvisionStage for KnowledgeBaseStage {
    fn name(&self) -> StageName {
        StageName::KnowledgeBase
    }

    async fn build(&self, ctx: &StageContext) -> crate::error::Result<Vec<ParameterEntry>> {
        let config = &ctx.config;
        let collection_arn = ctx.registry.read(ParamKey::CollectionArn).await?;
        let collection_name = ctx.registry.read(ParamKey::CollectionName).await?;

        let embedding_model_arn =
            config.foundation_model_arn(&config.knowledge_base.embedding_model_id);
        let bucket_arn = self.resolve_bucket_arn(ctx).await?;

        // Execution role: exactly the permissions the knowledge base
        // needs — invoke the embedding model, reach the collection,
        // read the source bucket.
        let kb_role = ctx
            .cloud
            .create_role(RoleSpec {
                name: format!("{}_role", config.kb_name()),
                assumed_by: "bedrock.amazonaws.com".to_string(),
                description: format!("Managed by ragstack - {}", config.kb_name()),
                statements: vec![
                    PolicyStatement::allow(&["bedrock:InvokeModel"], &[&embedding_model_arn]),
                    PolicyStatement::allow(&["aoss:APIAccessAll"], &[&collection_arn]),
                    PolicyStatement::allow(
                        &["s3:GetObject", "s3:ListBucket"],
                        &[&bucket_arn, &format!("{bucket_arn}/*")],
                    ),
                ],
            })
            .await?;

        // Second grant on the collection, this time for the knowledge
        // base's own role.
        ctx.cloud
            .put_access_policy(AccessPolicySpec {
                name: format!("{}-kbaccess", config.project),
                document: policy::data_access_policy_document(
                    &collection_name,
                    &[kb_role.arn.clone()],
                ),
            })
            .await?;

        let knowledge_base = ctx
            .cloud
            .create_knowledge_base(KnowledgeBaseSpec {
                name: config.kb_name(),
                description: format!("Managed by ragstack - {}", config.project),
                role_arn: kb_role.arn,
                embedding_model_arn,
                collection_arn,
                vector_index_name: config.index_name(),
                field_mapping: config.field_mapping(),
            })
            .await?;

        let data_source = ctx
            .cloud
            .create_data_source(DataSourceSpec {
                name: format!("{}_s3_source", config.project),
                description: format!("Managed by ragstack - {}", config.project),
                knowledge_base_id: knowledge_base.id.clone(),
                bucket_arn: bucket_arn.clone(),
                chunking: config.knowledge_base.chunking.to_wire(),
            })
            .await?;

        Ok(vec![
            ParameterEntry::new(
                ParamKey::KnowledgebaseId,
                knowledge_base.id,
                "Knowledge Base Id",
            ),
            ParameterEntry::new(
                ParamKey::KnowledgebaseArn,
                knowledge_base.arn,
                "Knowledge Base Arn",
            ),
            ParameterEntry::new(ParamKey::DatasourceId, data_source.id, "Data Source Id"),
            ParameterEntry::new(ParamKey::DataBucketArn, bucket_arn, "S3 Bucket Arn"),
        ])
    }
}
