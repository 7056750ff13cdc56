pub mod api;
pub mod config;
pub mod core;
pub mod llm;
pub mod tools;

pub use config::Config;
pub use core::{ChatOrchestrator, OrchestrationError};
pub use llm::{ChatMessage, ChatResult, LlmRouter};
pub use tools::ToolRegistry;

use anyhow::Result;
use std::sync::Arc;

/// Wire the router and the built-in tools into an orchestrator
pub fn build_orchestrator(config: &Config) -> Result<ChatOrchestrator> {
    let router = LlmRouter::from_config(config)?;

    match router.primary_label() {
        Some(label) => tracing::info!(
            provider = label,
            credentials = router.state().credential_count(),
            "Primary provider configured"
        ),
        None => tracing::warn!("No primary provider configured"),
    }
    match router.fallback_label() {
        Some(label) => tracing::info!(provider = label, "Fallback provider configured"),
        None => tracing::warn!("No fallback provider configured"),
    }

    Ok(ChatOrchestrator::new(Arc::new(router), ToolRegistry::builtin()))
}

pub async fn run(config: Config) -> Result<()> {
    tracing::info!("Starting chatrelay...");

    let orchestrator = build_orchestrator(&config)?;
    tracing::info!(
        tools = orchestrator.tools().list_tools().len(),
        "Tool registry initialized"
    );

    let api_adapter = api::WebApiAdapter::new(
        Arc::new(orchestrator),
        config.server.host.clone(),
        config.server.port,
    );
    api_adapter.start().await
}
