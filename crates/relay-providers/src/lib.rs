//! # Relay Providers
//!
//! LLM provider backends for the chat relay.
//!
//! One backend per upstream provider, selected by a closed name-based
//! switch in [`factory::backend_from_config`]. New providers are added
//! as a new module and a new factory branch, never by runtime plugins.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod factory;
pub mod openai;

pub use factory::backend_from_config;
pub use openai::OpenAiClient;
