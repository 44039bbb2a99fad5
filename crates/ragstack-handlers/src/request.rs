//! HTTP request and response shapes shared by the handlers.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Incoming API gateway request, reduced to what the handlers use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    #[serde(rename = "httpMethod")]
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: &str, path: &str, body: Option<&str>) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            body: body.map(str::to_string),
        }
    }
}

/// Outgoing API gateway response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    /// Bodies are always plain JSON text, never base64.
    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: bool,
}

impl ApiResponse {
    fn with_cors(status_code: u16, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
        headers.insert(
            "Access-Control-Allow-Headers".to_string(),
            "Content-Type,X-Api-Key".to_string(),
        );
        headers.insert(
            "Access-Control-Allow-Methods".to_string(),
            "OPTIONS,GET,POST".to_string(),
        );
        Self {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    /// 200 with a JSON body.
    pub fn ok(body: Value) -> Self {
        Self::with_cors(200, body.to_string())
    }

    /// 200 with a plain message wrapped in JSON.
    pub fn message(text: &str) -> Self {
        Self::ok(json!(text))
    }

    /// Server error with a JSON `error` field.
    pub fn server_error(detail: &str) -> Self {
        Self::with_cors(500, json!({ "error": detail }).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responses_carry_cors_headers() {
        let response = ApiResponse::message("OK");
        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.headers.get("Access-Control-Allow-Origin"),
            Some(&"*".to_string())
        );
    }

    #[test]
    fn test_error_body_shape() {
        let response = ApiResponse::server_error("boom");
        assert_eq!(response.status_code, 500);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["error"], "boom");
    }

    #[test]
    fn test_wire_shape_never_base64() {
        let wire = serde_json::to_value(ApiResponse::message("OK")).unwrap();
        assert_eq!(wire["isBase64Encoded"], false);
        assert_eq!(wire["statusCode"], 200);
    }
}
