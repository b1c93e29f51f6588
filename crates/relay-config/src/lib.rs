//! # Relay Config
//!
//! Environment-variable configuration for the chat relay.
//!
//! The deployment surface is a handful of environment variables; defaults
//! follow the upstream provider's public endpoint and a fixed model.
//! Parse failures surface as `config_error` so the operator sees a 500
//! rather than a silently wrong setting.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use relay_core::{RelayError, RelayResult};
use std::env;
use std::time::Duration;

/// Environment variable selecting the provider backend.
pub const ENV_PROVIDER: &str = "LLM_PROVIDER";
/// Environment variable naming the API-key secret identifier.
pub const ENV_OPENAI_SECRET_ID: &str = "OPENAI_API_KEY_SECRET_ID";
/// Environment variable overriding the OpenAI base URL.
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
/// Environment variable overriding the OpenAI model.
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
/// Environment variable overriding the request timeout, in seconds.
pub const ENV_OPENAI_TIMEOUT_S: &str = "OPENAI_TIMEOUT_S";

/// Default provider selection.
pub const DEFAULT_PROVIDER: &str = "openai";
/// Default OpenAI-compatible endpoint.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default model identifier.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Default request timeout in seconds.
pub const DEFAULT_OPENAI_TIMEOUT_S: f64 = 20.0;

/// Settings for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    /// Secret-store identifier for the API key. Required at client
    /// construction; the identifier itself is never logged.
    pub secret_id: String,
    /// Base URL of the chat completions API, without trailing slash.
    pub base_url: String,
    /// Model name sent upstream.
    pub model: String,
    /// Request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            secret_id: String::new(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            timeout: Duration::from_secs_f64(DEFAULT_OPENAI_TIMEOUT_S),
        }
    }
}

impl OpenAiSettings {
    /// Create settings for the given secret identifier.
    #[must_use]
    pub fn new(secret_id: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            ..Self::default()
        }
    }

    /// Override the base URL. Trailing slashes are trimmed.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Top-level relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Provider selection value, as configured (matched case-insensitively).
    pub provider: String,
    /// OpenAI backend settings.
    pub openai: OpenAiSettings,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            openai: OpenAiSettings::default(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from the process environment.
    ///
    /// Absent variables fall back to defaults; a present but unparseable
    /// timeout is a `config_error`.
    pub fn from_env() -> RelayResult<Self> {
        let provider = env_or(ENV_PROVIDER, DEFAULT_PROVIDER);

        let timeout_s = match env::var(ENV_OPENAI_TIMEOUT_S) {
            Ok(raw) => raw.trim().parse::<f64>().map_err(|_| {
                RelayError::config(format!("{ENV_OPENAI_TIMEOUT_S} must be a number of seconds"))
            })?,
            Err(_) => DEFAULT_OPENAI_TIMEOUT_S,
        };
        if !timeout_s.is_finite() || timeout_s <= 0.0 {
            return Err(RelayError::config(format!(
                "{ENV_OPENAI_TIMEOUT_S} must be a positive number of seconds"
            )));
        }

        let openai = OpenAiSettings {
            secret_id: env_or(ENV_OPENAI_SECRET_ID, ""),
            base_url: env_or(ENV_OPENAI_BASE_URL, DEFAULT_OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: env_or(ENV_OPENAI_MODEL, DEFAULT_OPENAI_MODEL),
            timeout: Duration::from_secs_f64(timeout_s),
        };

        Ok(Self { provider, openai })
    }

    /// Override the provider selection.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_public_endpoint() {
        let config = RelayConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.timeout, Duration::from_secs(20));
        assert!(config.openai.secret_id.is_empty());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let settings = OpenAiSettings::new("sid").with_base_url("https://example.test/v1/");
        assert_eq!(settings.base_url, "https://example.test/v1");
    }

    #[test]
    fn builder_overrides_apply() {
        let settings = OpenAiSettings::new("sid")
            .with_model("gpt-4o")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(settings.secret_id, "sid");
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }
}
