//! Request model and validation.
//!
//! The inbound payload is accepted as loosely-typed JSON and walked field
//! by field so that every constraint violation is reported, not just the
//! first. A [`ChatRequest`] can only be obtained through
//! [`ChatRequest::from_value`], so anything downstream of validation
//! holds an already-checked, immutable request.

use crate::error::{FieldError, RelayError, RelayResult};
use serde::Serialize;
use serde_json::{json, Value};

/// Default sampling temperature when the field is absent.
pub const DEFAULT_TEMPERATURE: f64 = 0.2;
/// Default completion budget when the field is absent.
pub const DEFAULT_MAX_TOKENS: u32 = 512;
/// Upper bound for `max_tokens`.
pub const MAX_TOKENS_LIMIT: u32 = 4096;

/// Role of a chat message author.
///
/// The wire names are exact; no case normalization is applied on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message.
    System,
    /// User message.
    User,
    /// Assistant message.
    Assistant,
}

impl MessageRole {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single validated chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Role of the message author.
    pub role: MessageRole,
    /// Message content, trimmed, guaranteed non-empty.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A validated chat completion request.
///
/// Immutable after validation; lives for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Ordered conversation, at least one message.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature in `[0.0, 2.0]`.
    pub temperature: f64,
    /// Completion budget in `[1, 4096]`.
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Validate a decoded JSON object into a `ChatRequest`.
    ///
    /// Collects every violation as a [`FieldError`] and fails with a
    /// single `validation_error` carrying the full list. Message content
    /// is stored trimmed; the raw offending values are never echoed back.
    pub fn from_value(value: &Value) -> RelayResult<Self> {
        let Some(body) = value.as_object() else {
            return Err(RelayError::validation(vec![FieldError::new(
                vec![],
                "request body must be a JSON object",
                "invalid_type",
            )]));
        };

        let mut errors = Vec::new();

        let messages = match body.get("messages") {
            None | Some(Value::Null) => {
                errors.push(FieldError::new(
                    vec![json!("messages")],
                    "messages is required",
                    "missing",
                ));
                Vec::new()
            }
            Some(Value::Array(items)) if items.is_empty() => {
                errors.push(FieldError::new(
                    vec![json!("messages")],
                    "messages must contain at least one message",
                    "too_short",
                ));
                Vec::new()
            }
            Some(Value::Array(items)) => validate_messages(items, &mut errors),
            Some(_) => {
                errors.push(FieldError::new(
                    vec![json!("messages")],
                    "messages must be an array",
                    "invalid_type",
                ));
                Vec::new()
            }
        };

        let temperature = validate_temperature(body.get("temperature"), &mut errors);
        let max_tokens = validate_max_tokens(body.get("max_tokens"), &mut errors);

        if !errors.is_empty() {
            return Err(RelayError::validation(errors));
        }

        Ok(Self {
            messages,
            temperature,
            max_tokens,
        })
    }
}

fn validate_messages(items: &[Value], errors: &mut Vec<FieldError>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let Some(message) = item.as_object() else {
            errors.push(FieldError::new(
                vec![json!("messages"), json!(index)],
                "message must be an object",
                "invalid_type",
            ));
            continue;
        };

        let role = match message.get("role") {
            None | Some(Value::Null) => {
                errors.push(FieldError::new(
                    vec![json!("messages"), json!(index), json!("role")],
                    "role is required",
                    "missing",
                ));
                None
            }
            Some(Value::String(raw)) => {
                let role = MessageRole::parse(raw);
                if role.is_none() {
                    errors.push(FieldError::new(
                        vec![json!("messages"), json!(index), json!("role")],
                        "role must be one of 'system', 'user' or 'assistant'",
                        "invalid_role",
                    ));
                }
                role
            }
            Some(_) => {
                errors.push(FieldError::new(
                    vec![json!("messages"), json!(index), json!("role")],
                    "role must be a string",
                    "invalid_type",
                ));
                None
            }
        };

        let content = match message.get("content") {
            None | Some(Value::Null) => {
                errors.push(FieldError::new(
                    vec![json!("messages"), json!(index), json!("content")],
                    "content is required",
                    "missing",
                ));
                None
            }
            Some(Value::String(raw)) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    errors.push(FieldError::new(
                        vec![json!("messages"), json!(index), json!("content")],
                        "content must not be empty",
                        "empty_content",
                    ));
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Some(_) => {
                errors.push(FieldError::new(
                    vec![json!("messages"), json!(index), json!("content")],
                    "content must be a string",
                    "invalid_type",
                ));
                None
            }
        };

        if let (Some(role), Some(content)) = (role, content) {
            messages.push(ChatMessage { role, content });
        }
    }

    messages
}

fn validate_temperature(value: Option<&Value>, errors: &mut Vec<FieldError>) -> f64 {
    match value {
        None | Some(Value::Null) => DEFAULT_TEMPERATURE,
        Some(raw) => match raw.as_f64() {
            Some(temperature) if (0.0..=2.0).contains(&temperature) => temperature,
            Some(_) => {
                errors.push(FieldError::new(
                    vec![json!("temperature")],
                    "temperature must be between 0.0 and 2.0",
                    "out_of_range",
                ));
                DEFAULT_TEMPERATURE
            }
            None => {
                errors.push(FieldError::new(
                    vec![json!("temperature")],
                    "temperature must be a number",
                    "invalid_type",
                ));
                DEFAULT_TEMPERATURE
            }
        },
    }
}

fn validate_max_tokens(value: Option<&Value>, errors: &mut Vec<FieldError>) -> u32 {
    match value {
        None | Some(Value::Null) => DEFAULT_MAX_TOKENS,
        Some(raw) => match raw.as_u64() {
            Some(max_tokens) if (1..=u64::from(MAX_TOKENS_LIMIT)).contains(&max_tokens) => {
                max_tokens as u32
            }
            Some(_) => {
                errors.push(FieldError::new(
                    vec![json!("max_tokens")],
                    "max_tokens must be between 1 and 4096",
                    "out_of_range",
                ));
                DEFAULT_MAX_TOKENS
            }
            None => {
                errors.push(FieldError::new(
                    vec![json!("max_tokens")],
                    "max_tokens must be an integer",
                    "invalid_type",
                ));
                DEFAULT_MAX_TOKENS
            }
        },
    }
}
