//! Purchase Advisor daemon.
//!
//! Serves the product-analysis API for the browser extension, backed by the
//! remote tool service and an OpenAI-compatible language model.

use std::env;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use purchase_advisor::advisor::Advisor;
use purchase_advisor::error::CoreResult;
use purchase_advisor::llm::{LlmSettings, OpenAiGenerator};
use purchase_advisor::server::Server;
use purchase_advisor::storage::HistoryStore;
use purchase_advisor::tools::HttpToolChannel;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_TOOLS_BASE_URL: &str = "http://127.0.0.1:8090";
const DEFAULT_HISTORY_DIR: &str = "history";

#[tokio::main]
async fn main() -> CoreResult<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "purchase advisor starting");

    let bind_addr = env_or("ADVISOR_ADDR", DEFAULT_BIND_ADDR);
    let tools_base_url = env_or("ADVISOR_TOOLS_BASE_URL", DEFAULT_TOOLS_BASE_URL);
    let history_dir = env_or("ADVISOR_HISTORY_DIR", DEFAULT_HISTORY_DIR);

    let channel = Arc::new(HttpToolChannel::new(tools_base_url)?);
    let generator = Arc::new(OpenAiGenerator::new(LlmSettings::from_env())?);
    let history = Arc::new(HistoryStore::new(history_dir));

    let advisor = Advisor::new(channel, generator, Some(history.clone()));
    let mut server = Server::start(&bind_addr, advisor, history).await?;
    tracing::info!(addr = %server.addr(), "listening");

    // Serve until interrupted; in-flight calls observe cancellation when
    // the runtime winds down.
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down gracefully");
    server.shutdown()?;
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}
