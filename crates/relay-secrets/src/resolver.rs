//! Process-lifetime secret caching.

use crate::source::SecretSource;
use relay_core::{RelayError, RelayResult};
use secrecy::SecretString;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Resolves secret identifiers to credential values, memoizing for the
/// life of the process.
///
/// The cache is read-mostly and written at most once per distinct
/// identifier; a concurrent double-fetch recomputes the same value, so
/// the overwrite is harmless. Failures are flattened to a generic
/// `config_error` that names neither the identifier nor the store.
pub struct SecretResolver {
    source: Box<dyn SecretSource>,
    cache: RwLock<HashMap<String, SecretString>>,
}

impl std::fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResolver").finish_non_exhaustive()
    }
}

impl SecretResolver {
    /// Create a resolver over the given source.
    #[must_use]
    pub fn new(source: impl SecretSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a secret identifier to its value.
    ///
    /// Cached resolutions return without an external call.
    ///
    /// # Errors
    /// `config_error` on any retrieval failure or if the resolved value
    /// is empty after trimming.
    pub async fn resolve(&self, secret_id: &str) -> RelayResult<SecretString> {
        if let Some(cached) = self.cache.read().await.get(secret_id) {
            return Ok(cached.clone());
        }

        let raw = self.source.fetch(secret_id).await.map_err(|err| {
            // Top-level error text only; never the identifier.
            debug!(error = %err, "secret fetch failed");
            RelayError::config("Failed to load secret from secret store")
        })?;

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RelayError::config("Resolved secret value is empty"));
        }

        let value = SecretString::new(trimmed.to_string());
        self.cache
            .write()
            .await
            .insert(secret_id.to_string(), value.clone());

        Ok(value)
    }

    /// Number of cached entries, for tests and diagnostics.
    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SecretError;
    use async_trait::async_trait;
    use secrecy::ExposeSecret;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        value: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SecretSource for CountingSource {
        async fn fetch(&self, _secret_id: &str) -> Result<String, SecretError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value.to_string())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl SecretSource for FailingSource {
        async fn fetch(&self, _secret_id: &str) -> Result<String, SecretError> {
            Err(SecretError::Status(403))
        }
    }

    #[tokio::test]
    async fn second_resolve_hits_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = SecretResolver::new(CountingSource {
            value: "sk-abc",
            calls: Arc::clone(&calls),
        });

        let first = resolver.resolve("prod/openai").await.expect("resolves");
        let second = resolver.resolve("prod/openai").await.expect("resolves");

        assert_eq!(first.expose_secret(), "sk-abc");
        assert_eq!(second.expose_secret(), "sk-abc");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached_len().await, 1);
    }

    #[tokio::test]
    async fn distinct_identifiers_cached_separately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = SecretResolver::new(CountingSource {
            value: "sk-abc",
            calls: Arc::clone(&calls),
        });

        resolver.resolve("first").await.expect("resolves");
        resolver.resolve("second").await.expect("resolves");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached_len().await, 2);
    }

    #[tokio::test]
    async fn failure_message_hides_identifier() {
        let resolver = SecretResolver::new(FailingSource);
        let err = resolver.resolve("prod/openai/api-key").await.unwrap_err();

        assert!(matches!(err, RelayError::Config { .. }));
        assert!(!err.to_string().contains("prod/openai/api-key"));
        assert!(!err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn whitespace_value_rejected() {
        let resolver = SecretResolver::new(CountingSource {
            value: "   ",
            calls: Arc::new(AtomicUsize::new(0)),
        });

        let err = resolver.resolve("blank").await.unwrap_err();
        assert!(matches!(err, RelayError::Config { .. }));
        assert_eq!(resolver.cached_len().await, 0);
    }

    #[tokio::test]
    async fn resolved_value_is_trimmed() {
        let resolver = SecretResolver::new(CountingSource {
            value: " sk-abc \n",
            calls: Arc::new(AtomicUsize::new(0)),
        });

        let value = resolver.resolve("padded").await.expect("resolves");
        assert_eq!(value.expose_secret(), "sk-abc");
    }
}
