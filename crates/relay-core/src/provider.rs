//! Provider backend abstraction.

use crate::error::RelayResult;
use crate::request::ChatRequest;
use crate::response::ProviderResponse;
use async_trait::async_trait;

/// A chat completion backend.
///
/// One implementation per upstream provider. A call makes exactly one
/// upstream request; retrying is the caller's decision, and no
/// implementation retries internally. Implementations must provide a
/// `Debug` that redacts credential material.
#[async_trait]
pub trait ChatBackend: Send + Sync + std::fmt::Debug {
    /// Stable name of the backend, for logging.
    fn name(&self) -> &str;

    /// Generate a completion for an already-validated request.
    ///
    /// # Errors
    /// `config_error` for credential problems, `upstream_error` for
    /// transport, status, or parse failures.
    async fn generate(&self, request: &ChatRequest) -> RelayResult<ProviderResponse>;
}
