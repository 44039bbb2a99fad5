//! Vector index management against the collection's data plane.

use async_trait::async_trait;
use serde_json::{json, Value};

use ragstack_cloud::FieldMapping;

use crate::error::{HandlerError, Result};

/// Dimensionality of the embedding vectors stored in the index. Fixed
/// by the embedding model family.
pub const VECTOR_DIMENSION: u32 = 1024;

/// HNSW graph parameters. Tuned once; changing them requires dropping
/// and rebuilding the index.
const HNSW_M: u32 = 16;
const HNSW_EF_CONSTRUCTION: u32 = 512;
const HNSW_EF_SEARCH: u32 = 512;

/// Full index definition for a knowledge-base vector index.
///
/// The field names come from the shared [`FieldMapping`]; the knowledge
/// base later queries by exactly these names, so any drift between the
/// two yields empty retrievals with no error anywhere.
pub fn index_body(mapping: &FieldMapping) -> Value {
    json!({
        "settings": {
            "index.knn": true,
            "index.knn.algo_param.ef_search": HNSW_EF_SEARCH,
        },
        "mappings": {
            "properties": {
                (mapping.vector_field.as_str()): {
                    "type": "knn_vector",
                    "dimension": VECTOR_DIMENSION,
                    "method": {
                        "name": "hnsw",
                        "engine": "faiss",
                        "space_type": "innerproduct",
                        "parameters": {
                            "ef_construction": HNSW_EF_CONSTRUCTION,
                            "m": HNSW_M,
                        },
                    },
                },
                (mapping.text_field.as_str()): { "type": "text" },
                (mapping.metadata_field.as_str()): { "type": "text", "index": false },
                "id": { "type": "text" },
            },
        },
    })
}

/// Data-plane operations on the collection's index namespace.
#[async_trait]
pub trait VectorIndexApi: Send + Sync {
    /// Whether the named index already exists.
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Create the named index with the given definition.
    async fn create_index(&self, index: &str, body: Value) -> Result<()>;

    /// Whether the named index is queryable yet. Collections accept the
    /// create call before the index is actually searchable.
    async fn index_ready(&self, index: &str) -> Result<bool>;
}

/// `VectorIndexApi` over the collection's REST data plane.
pub struct HttpVectorIndex {
    host: String,
    http_client: reqwest::Client,
}

impl HttpVectorIndex {
    pub fn new(host: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("ragstack-handlers/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HandlerError::VectorIndex(e.to_string()))?;
        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn index_url(&self, index: &str) -> String {
        format!("{}/{}", self.host, index)
    }
}

#[async_trait]
impl VectorIndexApi for HttpVectorIndex {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let response = self
            .http_client
            .head(self.index_url(index))
            .send()
            .await
            .map_err(|e| HandlerError::VectorIndex(e.to_string()))?;
        let status = response.status();
        if status.as_u16() == 404 {
            Ok(false)
        } else if status.is_success() {
            Ok(true)
        } else {
            Err(HandlerError::VectorIndex(format!(
                "unexpected status {status} checking index '{index}'"
            )))
        }
    }

    async fn create_index(&self, index: &str, body: Value) -> Result<()> {
        let response = self
            .http_client
            .put(self.index_url(index))
            .json(&body)
            .send()
            .await
            .map_err(|e| HandlerError::VectorIndex(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(HandlerError::VectorIndex(format!(
                "create of index '{index}' rejected: {detail}"
            )));
        }
        Ok(())
    }

    async fn index_ready(&self, index: &str) -> Result<bool> {
        // Readiness is observed, not assumed: the index exists once the
        // data plane answers the search endpoint for it.
        let response = self
            .http_client
            .get(format!("{}/_search?size=0", self.index_url(index)))
            .send()
            .await
            .map_err(|e| HandlerError::VectorIndex(e.to_string()))?;
        Ok(response.status().is_success())
    }
}
