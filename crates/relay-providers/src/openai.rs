//! OpenAI-compatible chat completions backend.
//!
//! Speaks the `POST {base_url}/chat/completions` wire contract with
//! bearer authentication. The upstream response is loosely typed and is
//! extracted field by field with per-field defaulting, so nothing
//! partially-typed crosses this boundary. Upstream response bodies are
//! never surfaced in errors; a non-2xx status is reported by its number
//! alone.

use async_trait::async_trait;
use relay_config::OpenAiSettings;
use relay_core::{ChatBackend, ChatRequest, ProviderResponse, RelayError, RelayResult, Usage};
use relay_secrets::SecretResolver;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Chat backend for OpenAI-compatible APIs.
pub struct OpenAiClient {
    settings: OpenAiSettings,
    resolver: Arc<SecretResolver>,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Create a client over the given settings and secret resolver.
    ///
    /// # Errors
    /// `config_error` if no secret identifier is configured; internal
    /// error if the HTTP client cannot be built.
    pub fn new(settings: OpenAiSettings, resolver: Arc<SecretResolver>) -> RelayResult<Self> {
        if settings.secret_id.trim().is_empty() {
            return Err(RelayError::config(
                "Missing OPENAI_API_KEY_SECRET_ID configuration",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| RelayError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            settings,
            resolver,
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    async fn api_key(&self) -> RelayResult<SecretString> {
        self.resolver
            .resolve(&self.settings.secret_id)
            .await
            .map_err(|err| {
                debug!(error = %err, "API key resolution failed");
                RelayError::config("Failed to load OpenAI API key from secret store")
            })
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &ChatRequest) -> RelayResult<ProviderResponse> {
        let api_key = self.api_key().await?;

        let payload = serde_json::json!({
            "model": self.settings.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                debug!(
                    timeout = err.is_timeout(),
                    connect = err.is_connect(),
                    "provider request failed"
                );
                RelayError::upstream("Failed to reach LLM provider")
            })?;

        let status = response.status();
        if !status.is_success() {
            // Only the numeric status; the body may be sensitive or huge.
            return Err(RelayError::upstream(format!(
                "LLM provider returned {}",
                status.as_u16()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|_| RelayError::upstream("LLM provider returned invalid JSON"))?;

        Ok(extract_response(&data, &self.settings.model))
    }
}

/// Extract a fully-typed response, defaulting each absent or ill-typed
/// field.
fn extract_response(data: &Value, configured_model: &str) -> ProviderResponse {
    let id = data
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string();

    let model = data
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(configured_model)
        .to_string();

    let content = data
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();

    let usage = data.get("usage");
    let usage = Usage::new(
        token_count(usage, "prompt_tokens"),
        token_count(usage, "completion_tokens"),
        token_count(usage, "total_tokens"),
    );

    ProviderResponse {
        id,
        model,
        content,
        usage,
    }
}

fn token_count(usage: Option<&Value>, field: &str) -> u64 {
    let Some(value) = usage.and_then(|u| u.get(field)) else {
        return 0;
    };

    // Some gateways report token counts as floats; coerce those too.
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(|n| n as u64)
        })
        .unwrap_or(0)
}
