//! Contract tests for the `ParameterRegistry` trait.
//!
//! Exercised against the in-memory fake; any conforming implementation
//! must satisfy the same behavior.

use ragstack_registry::fakes::MemoryRegistry;
use ragstack_registry::{ParamKey, ParameterEntry, ParameterRegistry, RegistryError};

#[tokio::test]
async fn publish_then_read_round_trip() {
    let registry = MemoryRegistry::new();
    registry
        .publish(ParameterEntry::new(
            ParamKey::CollectionArn,
            "arn:aws:aoss:us-east-1:111122223333:collection/abc",
            "Collection Arn",
        ))
        .await
        .unwrap();

    let value = registry.read(ParamKey::CollectionArn).await.unwrap();
    assert_eq!(value, "arn:aws:aoss:us-east-1:111122223333:collection/abc");
}

#[tokio::test]
async fn read_missing_key_names_publishing_stage() {
    let registry = MemoryRegistry::new();
    let err = registry.read(ParamKey::KnowledgebaseId).await.unwrap_err();

    match err {
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

#[tokio::test]
async fn republish_overwrites() {
    let registry = MemoryRegistry::new();
    registry
        .publish(ParameterEntry::new(ParamKey::VpcId, "vpc-old", "VPC ID"))
        .await
        .unwrap();
    registry
        .publish(ParameterEntry::new(ParamKey::VpcId, "vpc-new", "VPC ID"))
        .await
        .unwrap();

    assert_eq!(registry.read(ParamKey::VpcId).await.unwrap(), "vpc-new");
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn contains_reflects_publication() {
    let registry = MemoryRegistry::new();
    assert!(!registry.contains(ParamKey::ApiGateway).await.unwrap());

    registry
        .publish(ParameterEntry::new(
            ParamKey::ApiGateway,
            "api-123",
            "API Gateway ID",
        ))
        .await
        .unwrap();
    assert!(registry.contains(ParamKey::ApiGateway).await.unwrap());
}

#[tokio::test]
async fn describe_carries_description_and_timestamp() {
    let registry = MemoryRegistry::new();
    registry
        .publish(ParameterEntry::new(
            ParamKey::DatasourceId,
            "ds-42",
            "Data Source Id",
        ))
        .await
        .unwrap();

    let record = registry.describe(ParamKey::DatasourceId).await.unwrap();
    assert_eq!(record.value, "ds-42");
    assert_eq!(record.description, "Data Source Id");
    assert!(record.updated_at <= chrono::Utc::now());
}

#[tokio::test]
async fn unavailable_store_surfaces_on_publish_and_read() {
    let registry = MemoryRegistry::new();
    registry.set_unavailable(true);

    let publish_err = registry
        .publish(ParameterEntry::new(ParamKey::VpcId, "vpc-1", "VPC ID"))
        .await
        .unwrap_err();
    assert!(matches!(
        publish_err,
        RegistryError::RegistryUnavailable(_)
    ));

    let read_err = registry.read(ParamKey::VpcId).await.unwrap_err();
    assert!(matches!(read_err, RegistryError::RegistryUnavailable(_)));
}
