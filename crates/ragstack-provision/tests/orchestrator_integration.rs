//! End-to-end orchestrator runs against the in-memory control plane
//! and registry.

use std::sync::Arc;

use serde_json::json;

use ragstack_cloud::fakes::MemoryCloud;
use ragstack_provision::orchestrator::Orchestrator;
use ragstack_provision::stage::StageContext;
use ragstack_provision::stages::ApiStage;
use ragstack_provision::{DeployConfig, ProvisionError};
use ragstack_registry::fakes::MemoryRegistry;
use ragstack_registry::{ParamKey, ParameterRegistry, RegistryError};

fn test_config() -> DeployConfig {
    DeployConfig {
        account_id: "111122223333".to_string(),
        ..DeployConfig::default()
    }
}

fn test_ctx() -> (Arc<MemoryRegistry>, Arc<MemoryCloud>, StageContext) {
    let registry = Arc::new(MemoryRegistry::new());
    let cloud = Arc::new(MemoryCloud::new("us-east-1", "111122223333"));
    let ctx = StageContext::new(registry.clone(), cloud.clone(), test_config());
    (registry, cloud, ctx)
}

#[tokio::test]
async fn test_full_deploy_publishes_every_key() {
    let (registry, cloud, ctx) = test_ctx();

    let report = Orchestrator::new(ctx)
        .run(Orchestrator::default_stages())
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.created_count(), 4);
    assert_eq!(report.updated_count(), 0);
    for key in ParamKey::all() {
        assert!(
            registry.contains(*key).await.unwrap(),
            "{key} was not published"
        );
    }

    // The index-creation side effect fired exactly once, against the
    // index function, with a create request.
    let invocations = cloud.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].0, "chatbotdemo-kb-index-Lambda");
    assert_eq!(invocations[0].1, json!({ "RequestType": "Create" }));
}

#[tokio::test]
async fn test_redeploy_updates_in_place() {
    let (registry, cloud, ctx) = test_ctx();
    let orchestrator = Orchestrator::new(ctx);

    let first = orchestrator
        .run(Orchestrator::default_stages())
        .await
        .unwrap();
    let second = orchestrator
        .run(Orchestrator::default_stages())
        .await
        .unwrap();

    assert_eq!(first.created_count(), 4);
    assert_eq!(second.updated_count(), 4);
    assert_eq!(second.created_count(), 0);
    assert_eq!(registry.len(), ParamKey::all().len());

    // Same resource, reconciled twice rather than duplicated.
    assert_eq!(cloud.created("collection").len(), 1);
    assert_eq!(
        cloud.create_count("collection", "chatbotdemo-collection"),
        2
    );
}

#[tokio::test]
async fn test_api_stage_alone_fails_naming_missing_dependency() {
    let (_registry, _cloud, ctx) = test_ctx();

    let err = Orchestrator::new(ctx)
        .run(vec![Box::new(ApiStage)])
        .await
        .unwrap_err();

    let (stage, completed, source) = match err {
        ProvisionError::Halted {
            stage,
            completed,
            source,
        } => (stage, completed, source),
        other => panic!("expected Halted, got {other:?}"),
    };
    assert_eq!(stage, "api");
    assert!(completed.is_empty());

    match *source {
        ProvisionError::DependencyNotSatisfied {
            stage,
            dependency,
            source,
        } => {
            assert_eq!(stage, "api");
            assert_eq!(dependency, "knowledge_base");
            match source {
                RegistryError::KeyNotFound {
                    key,
                    publishing_stage,
                } => {
                    assert_eq!(key, ParamKey::KnowledgebaseId);
                    assert_eq!(publishing_stage, "knowledge_base");
                }
                other => panic!("expected KeyNotFound, got {other:?}"),
            }
        }
        other => panic!("expected DependencyNotSatisfied, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failure_stops_run_and_keeps_earlier_outputs() {
    let (registry, cloud, ctx) = test_ctx();
    cloud.fail_on("collection", "chatbotdemo-collection", "quota exceeded");

    let err = Orchestrator::new(ctx)
        .run(Orchestrator::default_stages())
        .await
        .unwrap_err();

    // The failure names the halted stage, carries the outcomes of the
    // stages that finished first, and wraps the control-plane error.
    let (stage, outcomes, source) = match err {
        ProvisionError::Halted {
            stage,
            completed,
            source,
        } => (stage, completed, source),
        other => panic!("expected Halted, got {other:?}"),
    };
    assert_eq!(stage, "vector_store");
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].published, vec![ParamKey::LambdaLayerArn]);
    assert!(matches!(*source, ProvisionError::Cloud(_)));

    // The layer stage completed and its key survives the failed run.
    assert!(registry.contains(ParamKey::LambdaLayerArn).await.unwrap());
    assert!(!registry.contains(ParamKey::CollectionArn).await.unwrap());
    // Nothing past the failing stage ran.
    assert!(cloud.created("knowledge_base").is_empty());
    assert!(cloud.created("rest_api").is_empty());
}

#[tokio::test]
async fn test_index_and_knowledge_base_share_the_field_mapping() {
    let (_registry, cloud, ctx) = test_ctx();

    Orchestrator::new(ctx)
        .run(Orchestrator::default_stages())
        .await
        .unwrap();

    let index_function = cloud
        .resource("function", "chatbotdemo-kb-index-Lambda")
        .unwrap();
    let knowledge_base = cloud.resource("knowledge_base", "chatbotdemo-kb").unwrap();

    // The vector field the index was created with must be the one the
    // knowledge base queries; a mismatch retrieves nothing, silently.
    assert_eq!(
        index_function["environment"]["VECTOR_FIELD_NAME"],
        knowledge_base["field_mapping"]["vector_field"]
    );
    assert_eq!(
        index_function["environment"]["VECTOR_INDEX_NAME"].as_str(),
        knowledge_base["vector_index_name"].as_str()
    );
}

#[tokio::test]
async fn test_query_function_env_carries_knowledge_base_id() {
    let (registry, cloud, ctx) = test_ctx();

    Orchestrator::new(ctx)
        .run(Orchestrator::default_stages())
        .await
        .unwrap();

    let kb_id = registry.read(ParamKey::KnowledgebaseId).await.unwrap();
    let query_function = cloud.resource("function", "chatbotdemo-QueryKb").unwrap();
    assert_eq!(
        query_function["environment"]["KNOWLEDGE_BASE_ID"].as_str(),
        Some(kb_id.as_str())
    );
    assert!(query_function["environment"]["MODEL_ARN"]
        .as_str()
        .unwrap()
        .ends_with("foundation-model/amazon.nova-micro-v1:0"));
}
