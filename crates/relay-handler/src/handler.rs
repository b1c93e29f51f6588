//! Request orchestration.
//!
//! decode inbound envelope → validate → resolve backend → call →
//! build the response envelope. Every branch logs exactly one
//! structured event carrying the request id and wall-clock latency;
//! message content and secret material never reach the log sink.

use crate::envelope::{FunctionEvent, FunctionResponse, InvocationContext};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use relay_config::RelayConfig;
use relay_core::{ChatBackend, ChatRequest, ProviderResponse, RelayError, RelayResult};
use relay_providers::backend_from_config;
use relay_secrets::SecretResolver;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Where the handler gets its backend from.
///
/// The factory path constructs the backend inside the invocation so
/// that configuration failures surface as response envelopes, not as
/// process crashes.
enum BackendSource {
    Fixed(Arc<dyn ChatBackend>),
    Factory {
        config: RelayConfig,
        resolver: Arc<SecretResolver>,
    },
}

/// The chat relay request handler.
pub struct ChatHandler {
    source: BackendSource,
}

impl ChatHandler {
    /// Handler over a fixed backend (tests, embedding).
    #[must_use]
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            source: BackendSource::Fixed(backend),
        }
    }

    /// Handler that selects its backend from configuration on each
    /// invocation.
    #[must_use]
    pub fn from_config(config: RelayConfig, resolver: Arc<SecretResolver>) -> Self {
        Self {
            source: BackendSource::Factory { config, resolver },
        }
    }

    /// Handler configured from the process environment.
    ///
    /// # Errors
    /// `config_error` if the environment holds unparseable settings.
    pub fn from_env(resolver: Arc<SecretResolver>) -> RelayResult<Self> {
        Ok(Self::from_config(RelayConfig::from_env()?, resolver))
    }

    /// Process one invocation and produce the outbound envelope.
    ///
    /// Never fails: every error is converted to an error envelope here.
    pub async fn handle(
        &self,
        event: &FunctionEvent,
        context: &InvocationContext,
    ) -> FunctionResponse {
        let start = Instant::now();

        let request_id = event
            .request_context
            .as_ref()
            .and_then(|ctx| ctx.request_id.clone())
            .or_else(|| context.invocation_id.clone());
        let request_id = request_id.as_deref();

        match self.process(event).await {
            Ok((response, message_count)) => {
                let latency_ms = elapsed_ms(start);
                info!(
                    request_id = ?request_id,
                    latency_ms,
                    model = %response.model,
                    prompt_tokens = response.usage.prompt_tokens,
                    completion_tokens = response.usage.completion_tokens,
                    total_tokens = response.usage.total_tokens,
                    message_count,
                    "chat_success"
                );

                json_response(
                    200,
                    json!({
                        "id": response.id,
                        "model": response.model,
                        "content": response.content,
                        "usage": response.usage,
                        "latency_ms": latency_ms,
                    }),
                    request_id,
                )
            }
            Err(err) => error_response(&err, elapsed_ms(start), request_id),
        }
    }

    async fn process(&self, event: &FunctionEvent) -> RelayResult<(ProviderResponse, usize)> {
        let data = decode_body(event)?;
        let request = ChatRequest::from_value(&data)?;
        let message_count = request.messages.len();

        let backend = match &self.source {
            BackendSource::Fixed(backend) => Arc::clone(backend),
            BackendSource::Factory { config, resolver } => {
                backend_from_config(config, Arc::clone(resolver))?
            }
        };

        let response = backend.generate(&request).await?;
        Ok((response, message_count))
    }
}

/// Decode the envelope body into a JSON value.
fn decode_body(event: &FunctionEvent) -> RelayResult<Value> {
    let raw = match &event.body {
        None | Some(Value::Null) => return Err(RelayError::bad_request("Missing request body")),
        Some(Value::String(raw)) => raw.as_str(),
        Some(_) => return Err(RelayError::bad_request("Request body must be a string")),
    };

    let text = if event.is_base64_encoded {
        let bytes = BASE64
            .decode(raw.trim())
            .map_err(|_| RelayError::bad_request("Request body is not valid base64"))?;
        String::from_utf8(bytes)
            .map_err(|_| RelayError::bad_request("Request body is not valid UTF-8"))?
    } else {
        raw.to_string()
    };

    serde_json::from_str(&text).map_err(|err| RelayError::bad_request(format!("Invalid JSON body: {err}")))
}

fn error_response(err: &RelayError, latency_ms: u64, request_id: Option<&str>) -> FunctionResponse {
    match err {
        RelayError::Validation { .. } => {
            warn!(request_id = ?request_id, latency_ms, "validation_error");
            json_response(
                err.status_code(),
                json!({
                    "error": {
                        "type": err.kind(),
                        "message": "Invalid request body",
                        "details": err.details(),
                    }
                }),
                request_id,
            )
        }
        RelayError::BadRequest { message } => {
            warn!(request_id = ?request_id, latency_ms, "bad_request");
            json_response(
                err.status_code(),
                json!({
                    "error": {
                        "type": err.kind(),
                        "message": message,
                    }
                }),
                request_id,
            )
        }
        RelayError::Upstream { message, .. } => {
            error!(request_id = ?request_id, latency_ms, "upstream_error");
            json_response(
                err.status_code(),
                json!({
                    "error": {
                        "type": err.kind(),
                        "message": message,
                    }
                }),
                request_id,
            )
        }
        RelayError::Config { message } => {
            error!(request_id = ?request_id, latency_ms, error_type = %err.kind(), "app_error");
            json_response(
                err.status_code(),
                json!({
                    "error": {
                        "type": err.kind(),
                        "message": message,
                        "details": err.details(),
                    }
                }),
                request_id,
            )
        }
        RelayError::Internal { message } => {
            // Full detail goes to the log sink only.
            error!(request_id = ?request_id, latency_ms, detail = %message, "internal_error");
            json_response(
                500,
                json!({
                    "error": {
                        "type": err.kind(),
                        "message": "Internal server error",
                    }
                }),
                request_id,
            )
        }
    }
}

fn json_response(status_code: u16, mut payload: Value, request_id: Option<&str>) -> FunctionResponse {
    if let (Some(id), Some(body)) = (request_id, payload.as_object_mut()) {
        body.insert("request_id".to_string(), json!(id));
    }

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());

    FunctionResponse {
        status_code,
        headers,
        body: serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string()),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_missing_body() {
        let err = decode_body(&FunctionEvent::default()).unwrap_err();
        assert!(matches!(err, RelayError::BadRequest { .. }));
        assert_eq!(err.to_string(), "Missing request body");
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let err = decode_body(&FunctionEvent::with_body("{not json")).unwrap_err();
        assert!(matches!(err, RelayError::BadRequest { .. }));
        assert!(err.to_string().starts_with("Invalid JSON body"));
    }

    #[test]
    fn decode_unwraps_base64() {
        let event = FunctionEvent {
            body: Some(json!(BASE64.encode(r#"{"x":1}"#))),
            is_base64_encoded: true,
            request_context: None,
        };
        let value = decode_body(&event).expect("decodes");
        assert_eq!(value["x"], 1);
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let event = FunctionEvent {
            body: Some(json!("%%%not-base64%%%")),
            is_base64_encoded: true,
            request_context: None,
        };
        let err = decode_body(&event).unwrap_err();
        assert_eq!(err.to_string(), "Request body is not valid base64");
    }

    #[test]
    fn decode_rejects_non_string_body() {
        let event = FunctionEvent {
            body: Some(json!({"messages": []})),
            is_base64_encoded: false,
            request_context: None,
        };
        let err = decode_body(&event).unwrap_err();
        assert!(matches!(err, RelayError::BadRequest { .. }));
        assert_eq!(err.to_string(), "Request body must be a string");
    }

    #[test]
    fn request_id_is_merged_into_payload() {
        let response = json_response(200, json!({"ok": true}), Some("req-9"));
        let body: Value = serde_json::from_str(&response.body).expect("json");
        assert_eq!(body["request_id"], "req-9");
    }

    #[test]
    fn headers_are_fixed() {
        let response = json_response(200, json!({}), None);
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(
            response
                .headers
                .get("Access-Control-Allow-Origin")
                .map(String::as_str),
            Some("*")
        );
    }

    #[test]
    fn internal_error_body_is_generic() {
        let err = RelayError::internal("secret detail that must not leak");
        let response = error_response(&err, 1, None);
        assert_eq!(response.status_code, 500);
        assert!(!response.body.contains("secret detail"));
        assert!(response.body.contains("Internal server error"));
    }

    #[test]
    fn upstream_error_body_has_no_details() {
        let err = RelayError::upstream("LLM provider returned 503");
        let response = error_response(&err, 1, None);
        let body: Value = serde_json::from_str(&response.body).expect("json");
        assert_eq!(response.status_code, 502);
        assert_eq!(body["error"]["type"], "upstream_error");
        assert!(body["error"].get("details").is_none());
    }
}
