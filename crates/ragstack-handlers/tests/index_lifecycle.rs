//! Index handler lifecycle against the in-memory index namespace.

use std::sync::Arc;

use serde_json::json;

use ragstack_handlers::fakes::MemoryVectorIndex;
use ragstack_handlers::{HandlerError, IndexConfig, IndexDisposition, IndexHandler};

fn test_config() -> IndexConfig {
    IndexConfig {
        collection_host: "https://collection.example.com".to_string(),
        index_name: "demo-kb-index".to_string(),
        vector_field_name: "vector-field".to_string(),
        region: "us-east-1".to_string(),
    }
}

#[tokio::test]
async fn test_creates_index_when_absent() {
    let index_api = Arc::new(MemoryVectorIndex::new());
    let handler = IndexHandler::new(test_config(), index_api.clone());

    let disposition = handler.ensure_index().await.unwrap();

    assert_eq!(disposition, IndexDisposition::Created);
    let definition = index_api.definition("demo-kb-index").unwrap();
    let vector = &definition["mappings"]["properties"]["vector-field"];
    assert_eq!(vector["dimension"], 1024);
    assert_eq!(vector["method"]["space_type"], "innerproduct");
}

#[tokio::test]
async fn test_reinvocation_leaves_existing_index_alone() {
    let index_api = Arc::new(
        MemoryVectorIndex::new().with_existing("demo-kb-index", json!({ "marker": "original" })),
    );
    let handler = IndexHandler::new(test_config(), index_api.clone());

    let disposition = handler.ensure_index().await.unwrap();

    assert_eq!(disposition, IndexDisposition::AlreadyExists);
    assert_eq!(
        index_api.definition("demo-kb-index").unwrap(),
        json!({ "marker": "original" })
    );
}

#[tokio::test(start_paused = true)]
async fn test_waits_until_index_is_queryable() {
    let index_api = Arc::new(MemoryVectorIndex::new());
    index_api.ready_after_polls("demo-kb-index", 3);
    let handler = IndexHandler::new(test_config(), index_api.clone());

    let disposition = handler.ensure_index().await.unwrap();

    assert_eq!(disposition, IndexDisposition::Created);
    assert_eq!(index_api.poll_count("demo-kb-index"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_readiness_deadline_is_bounded() {
    let index_api = Arc::new(MemoryVectorIndex::new());
    // Far more polls than the deadline allows at one poll per 5s.
    index_api.ready_after_polls("demo-kb-index", 1000);
    let handler = IndexHandler::new(test_config(), index_api);

    let err = handler.ensure_index().await.unwrap_err();
    assert!(matches!(err, HandlerError::IndexNotReady { .. }));
}

#[tokio::test]
async fn test_handle_reports_success_even_on_failure() {
    let index_api = Arc::new(MemoryVectorIndex::new());
    index_api.fail_create("access policy not yet propagated");
    let handler = IndexHandler::new(test_config(), index_api);

    let response = handler.handle(json!({ "RequestType": "Create" })).await;

    assert_eq!(response["statusCode"], 200);
    assert!(response["body"]
        .as_str()
        .unwrap()
        .contains("access policy not yet propagated"));
}

#[tokio::test]
async fn test_delete_request_is_a_noop() {
    let index_api = Arc::new(MemoryVectorIndex::new());
    let handler = IndexHandler::new(test_config(), index_api.clone());

    let response = handler.handle(json!({ "RequestType": "Delete" })).await;

    assert_eq!(response["statusCode"], 200);
    assert!(index_api.definition("demo-kb-index").is_none());
}

#[test]
fn test_from_env_lists_every_missing_variable() {
    for name in [
        ragstack_handlers::env::COLLECTION_HOST,
        ragstack_handlers::env::VECTOR_INDEX_NAME,
        ragstack_handlers::env::VECTOR_FIELD_NAME,
        ragstack_handlers::env::REGION_NAME,
    ] {
        std::env::remove_var(name);
    }

    let err = IndexConfig::from_env().unwrap_err();
    match err {
        HandlerError::MissingEnv { missing } => {
            assert_eq!(missing.len(), 4);
            assert!(missing.contains(&"COLLECTION_HOST".to_string()));
            assert!(missing.contains(&"REGION_NAME".to_string()));
        }
        other => panic!("expected MissingEnv, got {other:?}"),
    }
}
