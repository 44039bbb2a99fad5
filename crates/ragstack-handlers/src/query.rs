//! Query handler: the HTTP surface in front of the knowledge base.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::env;
use crate::error::{HandlerError, Result};
use crate::generation::GenerationClient;
use crate::request::{ApiRequest, ApiResponse};

/// Bounds on the question text, mirrored by the gateway's request
/// validator so malformed requests are rejected before they reach the
/// function at all.
const QUESTION_MIN_CHARS: usize = 1;
const QUESTION_MAX_CHARS: usize = 500;

/// Query handler configuration, read once at cold start. Missing
/// variables are all reported together.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub knowledge_base_id: String,
    pub model_arn: String,
}

impl QueryConfig {
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
            knowledge_base_id: read(env::KNOWLEDGE_BASE_ID),
            model_arn: read(env::MODEL_ARN),
        };
        if missing.is_empty() {
            Ok(config)
        } else {
            Err(HandlerError::MissingEnv { missing })
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuestionBody {
    question: String,
}

/// The query handler.
pub struct QueryHandler {
    generation: Arc<dyn GenerationClient>,
}

impl QueryHandler {
    pub fn new(generation: Arc<dyn GenerationClient>) -> Self {
        Self { generation }
    }

    /// Handle one API gateway request.
    ///
    /// Never returns an error: every failure — a malformed body as much
    /// as a generation failure — maps to a structured 500 so the
    /// gateway always has something well-formed to forward.
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        match (request.method.as_str(), request.path.as_str()) {
            // CORS preflight.
            ("OPTIONS", _) => ApiResponse::message("OK"),
            ("GET", "/health") => ApiResponse::message("Looks Good!"),
            ("POST", "/question") => self.answer_question(request.body.as_deref()).await,
            (method, path) => {
                ApiResponse::server_error(&format!("unsupported route: {method} {path}"))
            }
        }
    }

    async fn answer_question(&self, body: Option<&str>) -> ApiResponse {
        let question = match parse_question(body) {
            Ok(question) => question,
            Err(e) => return ApiResponse::server_error(&e.to_string()),
        };

        info!(event = "query.received", chars = question.len());
        match self.generation.answer(&question).await {
            Ok(answer) => ApiResponse::ok(json!({ "answer": answer })),
            Err(e) => {
                error!(event = "query.generation_failed", error = %e);
                ApiResponse::server_error(&e.to_string())
            }
        }
    }
}

fn parse_question(body: Option<&str>) -> Result<String> {
    let body = body.ok_or_else(|| HandlerError::InvalidRequest("empty body".to_string()))?;
    let parsed: QuestionBody = serde_json::from_str(body)
        .map_err(|e| HandlerError::InvalidRequest(format!("malformed body: {e}")))?;

    let chars = parsed.question.chars().count();
    if !(QUESTION_MIN_CHARS..=QUESTION_MAX_CHARS).contains(&chars) {
        return Err(HandlerError::InvalidRequest(format!(
            "question must be {QUESTION_MIN_CHARS}..={QUESTION_MAX_CHARS} characters, got {chars}"
        )));
    }
    Ok(parsed.question)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_question_bounds() {
        assert!(parse_question(Some(r#"{"question": "hi"}"#)).is_ok());
        assert!(parse_question(Some(r#"{"question": ""}"#)).is_err());
        let too_long = format!(r#"{{"question": "{}"}}"#, "x".repeat(501));
        assert!(parse_question(Some(&too_long)).is_err());
        assert!(parse_question(None).is_err());
        assert!(parse_question(Some("not json")).is_err());
    }

    #[test]
    fn test_question_length_counts_chars_not_bytes() {
        let multibyte = format!(r#"{{"question": "{}"}}"#, "é".repeat(500));
        assert!(parse_question(Some(&multibyte)).is_ok());
    }
}
