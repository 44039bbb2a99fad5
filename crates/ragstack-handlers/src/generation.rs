//! Retrieval-augmented generation client used by the query handler.

use async_trait::async_trait;
use serde_json::json;

use crate::error::{HandlerError, Result};

/// Answers a question by retrieving from the knowledge base and
/// generating with the configured model.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String>;
}

/// `GenerationClient` over the generation service's REST endpoint.
pub struct HttpGeneration {
    endpoint: String,
    knowledge_base_id: String,
    model_arn: String,
    http_client: reqwest::Client,
}

impl HttpGeneration {
    pub fn new(endpoint: &str, knowledge_base_id: &str, model_arn: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("ragstack-handlers/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HandlerError::Generation(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            knowledge_base_id: knowledge_base_id.to_string(),
            model_arn: model_arn.to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl GenerationClient for HttpGeneration {
    async fn answer(&self, question: &str) -> Result<String> {
        let payload = json!({
            "input": { "text": question },
            "retrieveAndGenerateConfiguration": {
                "type": "KNOWLEDGE_BASE",
                "knowledgeBaseConfiguration": {
                    "knowledgeBaseId": self.knowledge_base_id,
                    "modelArn": self.model_arn,
                },
            },
        });

        let response = self
            .http_client
            .post(format!("{}/retrieveAndGenerate", self.endpoint))
            .json(&payload)
            .send()
            .await
            .map_err(|e| HandlerError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(HandlerError::Generation(detail));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HandlerError::Generation(e.to_string()))?;
        body["output"]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                HandlerError::Generation("response carries no output text".to_string())
            })
    }
}
