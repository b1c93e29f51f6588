//! Backend selection.
//!
//! A closed, name-based switch: unknown or reserved selections fail at
//! construction time with `config_error`, before any request work.

use crate::openai::OpenAiClient;
use relay_config::RelayConfig;
use relay_core::{ChatBackend, RelayError, RelayResult};
use relay_secrets::SecretResolver;
use std::sync::Arc;

/// Reserved provider name, planned but not yet implemented.
const RESERVED_PROVIDER: &str = "bedrock";

/// Construct the configured chat backend.
///
/// The selection value is trimmed and matched case-insensitively.
///
/// # Errors
/// `config_error` for the reserved provider, for any unrecognized name,
/// or if the selected backend fails to construct.
pub fn backend_from_config(
    config: &RelayConfig,
    resolver: Arc<SecretResolver>,
) -> RelayResult<Arc<dyn ChatBackend>> {
    let provider = config.provider.trim().to_ascii_lowercase();

    match provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiClient::new(config.openai.clone(), resolver)?)),
        RESERVED_PROVIDER => Err(RelayError::config(format!(
            "{RESERVED_PROVIDER} provider is reserved and not yet implemented"
        ))),
        other => Err(RelayError::config(format!("Unknown LLM provider: {other}"))),
    }
}
