//! Error taxonomy for the relay pipeline.
//!
//! Every failure the pipeline can surface is one of a closed set of
//! [`ErrorKind`] categories, each with a fixed HTTP-like status code.
//! Secret values, secret identifiers, and raw upstream response bodies
//! must never be placed into any message or detail payload.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Result alias for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

/// The closed set of error categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing request body.
    BadRequest,
    /// Schema or constraint violation in the request body.
    ValidationError,
    /// Transport failure, non-2xx status, or bad JSON from the provider.
    UpstreamError,
    /// Missing or invalid deployment configuration, or secret failure.
    ConfigError,
    /// Any unclassified failure.
    InternalError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad_request"),
            Self::ValidationError => write!(f, "validation_error"),
            Self::UpstreamError => write!(f, "upstream_error"),
            Self::ConfigError => write!(f, "config_error"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

/// A single structured validation sub-error.
///
/// Mirrors the `{loc, msg, type}` triple exposed in validation error
/// details: a location path of field names and indices, a human-readable
/// message, and a machine-readable violation tag. The raw offending value
/// is deliberately not carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Path to the offending field, as field names and array indices.
    pub loc: Vec<Value>,
    /// Human-readable message.
    pub msg: String,
    /// Machine-readable violation tag.
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(loc: Vec<Value>, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }
    }
}

/// Error type for the relay pipeline.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The request body was missing, undecodable, or not valid JSON.
    #[error("{message}")]
    BadRequest {
        /// Parse error text, safe to return to the caller.
        message: String,
    },

    /// The request body violated one or more model constraints.
    #[error("Invalid request body")]
    Validation {
        /// Structured sub-errors, one per violation.
        details: Vec<FieldError>,
    },

    /// The upstream provider could not be reached or answered unusably.
    #[error("{message}")]
    Upstream {
        /// Generic message; never contains the upstream response body.
        message: String,
        /// Status code surfaced to the caller (502 unless overridden).
        status: u16,
    },

    /// Deployment configuration or secret retrieval failure.
    #[error("{message}")]
    Config {
        /// Generic message; never contains secret identifiers or values.
        message: String,
    },

    /// Any failure the pipeline did not anticipate.
    #[error("{message}")]
    Internal {
        /// Full detail, for the log sink only.
        message: String,
    },
}

impl RelayError {
    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a validation error from collected sub-errors.
    #[must_use]
    pub fn validation(details: Vec<FieldError>) -> Self {
        Self::Validation { details }
    }

    /// Create an upstream error with the default 502 status.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            status: 502,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The error category, as serialized into the `error.type` field.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            Self::Config { .. } => ErrorKind::ConfigError,
            Self::Internal { .. } => ErrorKind::InternalError,
        }
    }

    /// The HTTP-like status code for the response envelope.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } | Self::Validation { .. } => 400,
            Self::Upstream { status, .. } => *status,
            Self::Config { .. } | Self::Internal { .. } => 500,
        }
    }

    /// Structured detail payload, if this error kind carries one.
    #[must_use]
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::Validation { details } => serde_json::to_value(details).ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::UpstreamError).unwrap();
        assert_eq!(json, "\"upstream_error\"");
        assert_eq!(ErrorKind::ConfigError.to_string(), "config_error");
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(RelayError::bad_request("x").status_code(), 400);
        assert_eq!(RelayError::validation(vec![]).status_code(), 400);
        assert_eq!(RelayError::upstream("x").status_code(), 502);
        assert_eq!(RelayError::config("x").status_code(), 500);
        assert_eq!(RelayError::internal("x").status_code(), 500);
    }

    #[test]
    fn validation_details_round_trip() {
        let err = RelayError::validation(vec![FieldError::new(
            vec![json!("messages"), json!(0), json!("content")],
            "content must not be empty",
            "empty_content",
        )]);

        let details = err.details().expect("validation carries details");
        assert_eq!(details[0]["loc"][2], "content");
        assert_eq!(details[0]["type"], "empty_content");
        assert_eq!(err.to_string(), "Invalid request body");
    }

    #[test]
    fn only_validation_carries_details() {
        assert!(RelayError::upstream("x").details().is_none());
        assert!(RelayError::config("x").details().is_none());
    }
}
