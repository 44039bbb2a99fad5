//! Typed cross-stage parameter keys.
//!
//! Every value handed off between provisioning stages is published under
//! one of these keys. Using an enum instead of raw strings means a typo
//! in a key name is a compile error, not a runtime `KeyNotFound` three
//! stages later.

use serde::{Deserialize, Serialize};

/// All keys published into the parameter registry during a deployment.
///
/// Wire names (`as_str`) are flat strings under a single namespace and
/// are part of the external contract: already-deployed environments are
/// read back by these exact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamKey {
    /// ARN of the shared runtime dependency layer.
    LambdaLayerArn,

    /// ARN of the vector-search collection.
    CollectionArn,

    /// Id of the vector-search collection.
    CollectionId,

    /// Name of the vector-search collection.
    CollectionName,

    /// Id of the managed knowledge base.
    KnowledgebaseId,

    /// ARN of the managed knowledge base.
    KnowledgebaseArn,

    /// Id of the knowledge base's data source.
    DatasourceId,

    /// ARN of the object-store bucket holding source documents.
    DataBucketArn,

    /// Id of the private network the API runs in.
    VpcId,

    /// ARN of the query function.
    QueryLambdaArn,

    /// Id of the REST API in front of the query function.
    ApiGateway,

    /// Id of the API usage plan (throttle + quota + key).
    ApiUsagePlanId,
}

impl ParamKey {
    /// Wire name of the key as stored in the parameter service.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::LambdaLayerArn => "lambdalayerArn",
            ParamKey::CollectionArn => "collectionArn",
            ParamKey::CollectionId => "collectionId",
            ParamKey::CollectionName => "collectionName",
            ParamKey::KnowledgebaseId => "knowledgebaseId",
            ParamKey::KnowledgebaseArn => "knowledgebaseArn",
            ParamKey::DatasourceId => "datasourceId",
            ParamKey::DataBucketArn => "databucketArn",
            ParamKey::VpcId => "vpcid",
            ParamKey::QueryLambdaArn => "querylambdaArn",
            ParamKey::ApiGateway => "apigateway",
            ParamKey::ApiUsagePlanId => "APIUsagePlanID",
        }
    }

    /// Name of the stage responsible for publishing this key.
    ///
    /// Used to make a missing-key error actionable: the error names both
    /// the key and the stage that should have published it.
    pub fn published_by(&self) -> &'static str {
        match self {
            ParamKey::LambdaLayerArn => "lambda_layer",
            ParamKey::CollectionArn
            | ParamKey::CollectionId
            | ParamKey::CollectionName => "vector_store",
            ParamKey::KnowledgebaseId
            | ParamKey::KnowledgebaseArn
            | ParamKey::DatasourceId
            | ParamKey::DataBucketArn => "knowledge_base",
            ParamKey::VpcId
            | ParamKey::QueryLambdaArn
            | ParamKey::ApiGateway
            | ParamKey::ApiUsagePlanId => "api",
        }
    }

    /// Every key, in publication order.
    pub fn all() -> &'static [ParamKey] {
        &[
            ParamKey::LambdaLayerArn,
            ParamKey::CollectionArn,
            ParamKey::CollectionId,
            ParamKey::CollectionName,
            ParamKey::KnowledgebaseId,
            ParamKey::KnowledgebaseArn,
            ParamKey::DatasourceId,
            ParamKey::DataBucketArn,
            ParamKey::VpcId,
            ParamKey::QueryLambdaArn,
            ParamKey::ApiGateway,
            ParamKey::ApiUsagePlanId,
        ]
    }
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
