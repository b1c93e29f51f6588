//! # Relay Handler
//!
//! Invocation envelope handling and orchestration for the chat relay.
//!
//! The handler is the one place where every pipeline failure is caught
//! and converted into a response envelope; nothing escapes uncaught.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod handler;

pub use envelope::{FunctionEvent, FunctionResponse, InvocationContext, RequestContext};
pub use handler::ChatHandler;
