//! # LLM Chat Relay
//!
//! Function-hosted chat completion relay: validates an inbound chat
//! request, forwards it to the configured upstream LLM provider, and
//! returns a normalized JSON envelope.
//!
//! The binary is a single-invocation driver for the handler library:
//! it reads one invocation envelope as JSON from stdin and writes the
//! response envelope to stdout. The hosting runtime's transport is an
//! external collaborator; everything behind the envelope boundary lives
//! in the `relay-*` crates.
//!
//! ## Usage
//!
//! ```bash
//! echo '{"body":"{\"messages\":[{\"role\":\"user\",\"content\":\"hi\"}]}"}' \
//!     | llm-chat-relay
//! ```

use relay_handler::{ChatHandler, FunctionEvent, InvocationContext};
use relay_secrets::{EnvSecretSource, SecretResolver, SecretsManagerSource};
use std::io::Read;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the secret store backend.
const ENV_SECRETS_SOURCE: &str = "RELAY_SECRETS_SOURCE";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting LLM Chat Relay"
    );

    if let Err(e) = run().await {
        error!(error = %e, "Invocation driver failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let resolver = build_resolver()?;
    let handler = ChatHandler::from_env(resolver)?;

    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    let event: FunctionEvent = serde_json::from_str(&raw)?;

    // The driver has no runtime-assigned invocation id to fall back on.
    let context = InvocationContext::default();
    let response = handler.handle(&event, &context).await;

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

/// Select the secret store from the environment.
///
/// `aws` (default) talks to AWS Secrets Manager; `env` reads secrets
/// from environment variables, for local runs.
fn build_resolver() -> Result<Arc<SecretResolver>, Box<dyn std::error::Error>> {
    let source = std::env::var(ENV_SECRETS_SOURCE).unwrap_or_else(|_| "aws".to_string());

    let resolver = match source.trim().to_ascii_lowercase().as_str() {
        "env" => SecretResolver::new(EnvSecretSource),
        _ => SecretResolver::new(SecretsManagerSource::from_env()?),
    };

    Ok(Arc::new(resolver))
}
