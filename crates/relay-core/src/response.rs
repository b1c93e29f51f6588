//! Normalized provider response types.

use serde::Serialize;

/// Token usage reported by the provider, zeroed when absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u64,
    /// Tokens produced by the completion.
    pub completion_tokens: u64,
    /// Total tokens billed.
    pub total_tokens: u64,
}

impl Usage {
    /// Create a usage record.
    #[must_use]
    pub fn new(prompt_tokens: u64, completion_tokens: u64, total_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

/// Fully-typed response extracted from one provider call.
///
/// Partially-typed upstream structures never cross the provider boundary;
/// each field is defaulted during extraction if the upstream omitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderResponse {
    /// Provider-assigned completion id ("unknown" when absent).
    pub id: String,
    /// Model that produced the completion.
    pub model: String,
    /// Completion text, trimmed ("" when absent).
    pub content: String,
    /// Token usage.
    pub usage: Usage,
}
