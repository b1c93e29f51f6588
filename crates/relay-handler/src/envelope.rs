//! Invocation envelope types.
//!
//! The hosting function runtime wraps the HTTP request and response in
//! JSON envelopes; only the fields consumed here are modeled.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Inbound invocation envelope from the hosting runtime.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    /// Raw request body. Expected to be a JSON-encoded string (possibly
    /// base64-wrapped); any other JSON type is accepted here and
    /// rejected as a bad request during decoding.
    #[serde(default)]
    pub body: Option<Value>,
    /// Whether `body` is base64-encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,
    /// Request-scoped context from the HTTP front end.
    #[serde(default)]
    pub request_context: Option<RequestContext>,
}

impl FunctionEvent {
    /// Build an event carrying a plain (non-base64) string body.
    #[must_use]
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(Value::String(body.into())),
            ..Self::default()
        }
    }
}

/// Request context carried by the inbound envelope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Tracing identifier assigned by the HTTP front end.
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Invocation context from the hosting runtime.
///
/// Carries the runtime's own invocation identifier, used as a fallback
/// when the envelope has no request id.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    /// Runtime-assigned invocation identifier.
    pub invocation_id: Option<String>,
}

impl InvocationContext {
    /// Context with a known invocation identifier.
    #[must_use]
    pub fn new(invocation_id: impl Into<String>) -> Self {
        Self {
            invocation_id: Some(invocation_id.into()),
        }
    }
}

/// Outbound invocation envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    /// HTTP-like status code.
    pub status_code: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded response body.
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_deserializes_runtime_field_names() {
        let event: FunctionEvent = serde_json::from_value(json!({
            "body": "eyJ4IjoxfQ==",
            "isBase64Encoded": true,
            "requestContext": {"requestId": "req-1"}
        }))
        .expect("deserializes");

        assert!(event.is_base64_encoded);
        assert_eq!(
            event.request_context.and_then(|c| c.request_id).as_deref(),
            Some("req-1")
        );
    }

    #[test]
    fn event_accepts_non_string_body() {
        let event: FunctionEvent =
            serde_json::from_value(json!({"body": 123})).expect("deserializes");
        assert_eq!(event.body, Some(json!(123)));
    }

    #[test]
    fn event_tolerates_missing_fields() {
        let event: FunctionEvent = serde_json::from_value(json!({})).expect("deserializes");
        assert!(event.body.is_none());
        assert!(!event.is_base64_encoded);
        assert!(event.request_context.is_none());
    }

    #[test]
    fn response_serializes_status_code_camel_case() {
        let response = FunctionResponse {
            status_code: 200,
            headers: BTreeMap::new(),
            body: "{}".to_string(),
        };
        let json = serde_json::to_value(&response).expect("serializes");
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"], "{}");
    }
}
