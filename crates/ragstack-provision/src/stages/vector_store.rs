//! Vector-store stage: encrypted, network-policed collection plus the
//! one-time index-creation trigger.
//!
//! Order matters here: the platform rejects index operations before the
//! data-access policy has propagated, so the policies are created
//! first, then the collection, and the index trigger fires strictly
//! last.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use ragstack_cloud::{
    policy, AccessPolicySpec, CollectionSpec, CollectionType, FunctionSpec, PolicyStatement,
    RoleSpec, SecurityPolicySpec, SecurityPolicyType,
};
use ragstack_registry::{ParamKey, ParameterEntry};

use crate::config::{EncryptionKeySource, NetworkAccess};
use crate::stage::{ProvisionStage, StageContext, StageName};

/// Trigger ceiling for the index-creation invocation. Distinct from the
/// function's own 15-minute execution ceiling.
const INDEX_TRIGGER_TIMEOUT: Duration = Duration::from_secs(120);

/// Execution ceiling of the index-creation function.
const INDEX_FUNCTION_TIMEOUT_SECS: u64 = 15 * 60;

/// Creates the vector-search collection, its policies, and registers
/// the index-creation side effect.
pub struct VectorStoreStage;

#[async_trait]
impl ProvisionStage for VectorStoreStage {
    fn name(&self) -> StageName {
        StageName::VectorStore
    }

    async fn build(&self, ctx: &StageContext) -> crate::error::Result<Vec<ParameterEntry>> {
        let config = &ctx.config;
        let collection_name = config.collection_name();
        let layer_arn = ctx.registry.read(ParamKey::LambdaLayerArn).await?;

        // Encryption: platform-owned key, or a newly minted customer key.
        let kms_key_arn = match &config.vector_store.encryption {
            EncryptionKeySource::PlatformManaged => None,
            EncryptionKeySource::CustomerManaged { alias } => {
                Some(ctx.cloud.create_key(alias).await?.arn)
            }
        };
        ctx.cloud
            .put_security_policy(SecurityPolicySpec {
                name: format!("{collection_name}-enc"),
                policy_type: SecurityPolicyType::Encryption,
                document: policy::encryption_policy_document(
                    &collection_name,
                    kms_key_arn.as_deref(),
                ),
            })
            .await?;

        // Network exposure: public, or a single private endpoint.
        let vpc_endpoint = match &config.vector_store.network {
            NetworkAccess::Public => None,
            NetworkAccess::VpcEndpoint { endpoint_id } => Some(endpoint_id.as_str()),
        };
        ctx.cloud
            .put_security_policy(SecurityPolicySpec {
                name: format!("{collection_name}-net"),
                policy_type: SecurityPolicyType::Network,
                document: policy::network_policy_document(&collection_name, vpc_endpoint),
            })
            .await?;

        // Execution role for the index-creation function.
        let index_function_name = format!("{}-Lambda", config.index_name());
        let index_role = ctx
            .cloud
            .create_role(RoleSpec {
                name: format!("{index_function_name}-role"),
                assumed_by: "lambda.amazonaws.com".to_string(),
                description: format!("Managed by ragstack - {index_function_name}"),
                statements: vec![PolicyStatement::allow(
                    &["logs:CreateLogStream", "logs:PutLogEvents"],
                    &[&format!(
                        "arn:{}:logs:{}:{}:log-group:/aws/lambda/{}:*",
                        config.partition(),
                        config.region,
                        config.account_id,
                        index_function_name
                    )],
                )],
            })
            .await?;

        // Data access for the account root and the index function.
        ctx.cloud
            .put_access_policy(AccessPolicySpec {
                name: format!("{collection_name}-access"),
                document: policy::data_access_policy_document(
                    &collection_name,
                    &[config.account_root_arn(), index_role.arn.clone()],
                ),
            })
            .await?;

        // The collection itself, after all three policies exist.
        let collection = ctx
            .cloud
            .create_collection(CollectionSpec {
                name: collection_name.clone(),
                description: format!("Managed by ragstack - {}", config.project),
                collection_type: CollectionType::VectorSearch,
            })
            .await?;

        // The role can only name the collection id once it exists.
        ctx.cloud
            .attach_role_statement(
                &index_role.name,
                PolicyStatement::allow(
                    &["aoss:APIAccessAll"],
                    &[&format!(
                        "arn:{}:aoss:{}:{}:collection/{}",
                        config.partition(),
                        config.region,
                        config.account_id,
                        collection.id
                    )],
                ),
            )
            .await?;

        // Index-creation function. Environment names are the contract
        // consumed by ragstack_handlers::IndexConfig::from_env.
        let mut environment = BTreeMap::new();
        environment.insert("REGION_NAME".to_string(), config.region.clone());
        environment.insert("COLLECTION_HOST".to_string(), collection.endpoint.clone());
        environment.insert("VECTOR_INDEX_NAME".to_string(), config.index_name());
        environment.insert(
            "VECTOR_FIELD_NAME".to_string(),
            config.vector_store.vector_field_name.clone(),
        );
        let index_function = ctx
            .cloud
            .create_function(FunctionSpec {
                name: index_function_name,
                description: format!("Managed by ragstack - {}", config.project),
                handler: "bootstrap".to_string(),
                role_arn: index_role.arn,
                environment,
                timeout_secs: INDEX_FUNCTION_TIMEOUT_SECS,
                memory_mb: 1024,
                layer_arns: vec![layer_arn],
                vpc: None,
            })
            .await?;

        // One-time side effect: create the index, strictly after the
        // collection and its policies. Idempotent under retry.
        info!(event = "vector_store.index_trigger", function = %index_function.name);
        ctx.cloud
            .invoke_function(
                &index_function.name,
                json!({ "RequestType": "Create" }),
                INDEX_TRIGGER_TIMEOUT,
            )
            .await?;

        Ok(vec![
            ParameterEntry::new(ParamKey::CollectionArn, collection.arn, "Collection Arn"),
            ParameterEntry::new(ParamKey::CollectionId, collection.id, "Collection Id"),
            ParameterEntry::new(ParamKey::CollectionName, collection.name, "Collection Name"),
        ])
    }
}
