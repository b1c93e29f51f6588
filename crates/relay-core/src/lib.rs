//! # Relay Core
//!
//! Core types, traits, and error handling for the chat relay.
//!
//! This crate provides the foundational types used throughout the relay:
//! - The validated request model
//! - The provider backend trait and its normalized response
//! - The error taxonomy surfaced to callers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod provider;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use error::{ErrorKind, FieldError, RelayError, RelayResult};
pub use provider::ChatBackend;
pub use request::{ChatMessage, ChatRequest, MessageRole};
pub use response::{ProviderResponse, Usage};
