//! # Relay Secrets
//!
//! Secret retrieval and in-process caching for the chat relay.
//!
//! A [`SecretSource`] fetches a credential value by logical identifier
//! from an external store; the [`SecretResolver`] wraps a source with a
//! process-lifetime cache and maps every failure to a generic
//! `config_error` so that neither the identifier nor any store detail
//! can leak into a response or log.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod resolver;
pub mod source;

pub use resolver::SecretResolver;
pub use source::{EnvSecretSource, SecretError, SecretSource, SecretsManagerSource};
