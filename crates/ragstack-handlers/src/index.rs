//! Index-creation handler.
//!
//! Invoked once per deploy, right after the collection exists. Creates
//! the vector index if it is missing and waits until it is queryable.
//! The invocation always reports success to its caller: a failed index
//! creation must not roll back the surrounding deploy, so failures are
//! logged loudly instead of propagated.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::{error, info};

use ragstack_cloud::FieldMapping;

use crate::env;
use crate::error::{HandlerError, Result};
use crate::vector_index::{index_body, VectorIndexApi};

/// How often readiness is re-checked after a create.
const READINESS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How long a freshly created index gets to become queryable.
const READINESS_DEADLINE: Duration = Duration::from_secs(120);

/// Index handler configuration, read once at cold start.
///
/// Every variable is validated eagerly; a misdeployed function fails on
/// its first invocation with the complete list of what is missing
/// rather than partway through with the first one.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub collection_host: String,
    pub index_name: String,
    pub vector_field_name: String,
    pub region: String,
}

impl IndexConfig {
    pub fn from_env() -> Result<Self> {
        let mut missing = Vec::new();
        let mut read = |name: &'static str| match std::env::var(name) {
            Ok(value) if !value.is_empty() => value,
            _ => {
                missing.push(name.to_string());
                String::new()
            }
        };

        let config = Self {
            collection_host: read(env::COLLECTION_HOST),
            index_name: read(env::VECTOR_INDEX_NAME),
            vector_field_name: read(env::VECTOR_FIELD_NAME),
            region: read(env::REGION_NAME),
        };
        if missing.is_empty() {
            Ok(config)
        } else {
            Err(HandlerError::MissingEnv { missing })
        }
    }

    /// Field mapping the index is created with. Must match what the
    /// knowledge base was bound with.
    pub fn field_mapping(&self) -> FieldMapping {
        FieldMapping::default().with_vector_field(&self.vector_field_name)
    }
}

/// What the handler found and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexDisposition {
    /// The index already existed; nothing was created.
    AlreadyExists,
    /// The index was created and became queryable.
    Created,
}

/// The index-creation handler.
pub struct IndexHandler {
    config: IndexConfig,
    index_api: Arc<dyn VectorIndexApi>,
}

impl IndexHandler {
    pub fn new(config: IndexConfig, index_api: Arc<dyn VectorIndexApi>) -> Self {
        Self { config, index_api }
    }

    /// Handle one invocation.
    ///
    /// Always answers 200. A failure is logged with its full error
    /// chain and reported in the body, never raised — the deploy that
    /// triggered this invocation must not fail because of it.
    pub async fn handle(&self, event: Value) -> Value {
        let request_type = event["RequestType"].as_str().unwrap_or("Create");
        if request_type == "Delete" {
            // Indexes die with their collection; nothing to tear down.
            return json!({ "statusCode": 200, "body": "nothing to delete" });
        }

        match self.ensure_index().await {
            Ok(disposition) => {
                info!(
                    event = "index.ensured",
                    index = %self.config.index_name,
                    ?disposition
                );
                json!({ "statusCode": 200, "body": format!("{disposition:?}") })
            }
            Err(e) => {
                error!(
                    event = "index.create_failed",
                    index = %self.config.index_name,
                    error = %e
                );
                json!({ "statusCode": 200, "body": format!("failed: {e}") })
            }
        }
    }

    /// Create the index if absent, then wait for it to be queryable.
    /// Idempotent: re-invocation against an existing index is a no-op.
    pub async fn ensure_index(&self) -> Result<IndexDisposition> {
        let index = &self.config.index_name;
        if self.index_api.index_exists(index).await? {
            return Ok(IndexDisposition::AlreadyExists);
        }

        let body = index_body(&self.config.field_mapping());
        self.index_api.create_index(index, body).await?;
        self.wait_until_ready(index).await?;
        Ok(IndexDisposition::Created)
    }

    /// Poll readiness on a fixed interval, bounded by a hard deadline.
    async fn wait_until_ready(&self, index: &str) -> Result<()> {
        let deadline = Instant::now() + READINESS_DEADLINE;
        loop {
            if self.index_api.index_ready(index).await? {
                return Ok(());
            }
            if Instant::now() + READINESS_POLL_INTERVAL > deadline {
                return Err(HandlerError::IndexNotReady {
                    index: index.to_string(),
                    waited_secs: READINESS_DEADLINE.as_secs(),
                });
            }
            sleep(READINESS_POLL_INTERVAL).await;
        }
    }
}
