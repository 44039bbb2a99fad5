//! Field-mapping round trip between index creation and retrieval.
//!
//! The knowledge base queries the index by the field names it was bound
//! with. If those drift from the names the index was created with,
//! retrieval silently finds nothing — the only symptom is an empty
//! answer, never an error.

use std::sync::Arc;

use serde_json::Value;

use ragstack_cloud::FieldMapping;
use ragstack_handlers::fakes::MappedRetrieval;
use ragstack_handlers::{ApiRequest, QueryHandler};

const QUESTION: &str = r#"{"question": "What is the capital of France?"}"#;

#[tokio::test]
async fn test_matching_mapping_retrieves_an_answer() {
    let mapping = FieldMapping::default();
    let generation = Arc::new(
        MappedRetrieval::new(mapping.clone(), mapping)
            .with_passage("The capital of France is Paris."),
    );
    let handler = QueryHandler::new(generation);

    let response = handler
        .handle(ApiRequest::new("POST", "/question", Some(QUESTION)))
        .await;

    assert_eq!(response.status_code, 200);
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert!(body["answer"].as_str().unwrap().contains("Paris"));
}

#[tokio::test]
async fn test_drifted_mapping_answers_empty_with_no_error() {
    let index_mapping = FieldMapping::default();
    let query_mapping = FieldMapping::default().with_vector_field("embeddings");
    let generation = Arc::new(
        MappedRetrieval::new(index_mapping, query_mapping)
            .with_passage("The capital of France is Paris."),
    );
    let handler = QueryHandler::new(generation);

    let response = handler
        .handle(ApiRequest::new("POST", "/question", Some(QUESTION)))
        .await;

    // Success on the wire, nothing retrieved, no error anywhere.
    assert_eq!(response.status_code, 200);
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["answer"], "");
    assert!(body.get("error").is_none());
}
