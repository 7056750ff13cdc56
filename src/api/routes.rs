use super::error::ApiError;
use super::response::*;
use crate::core::ChatOrchestrator;
use crate::llm::ToolSchema;
use crate::tools::ToolOutcome;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use std::time::Instant;

/// Largest accepted conversation, in messages
const MAX_MESSAGES: usize = 200;

/// POST /api/chat
pub async fn chat(
    State(orchestrator): State<Arc<ChatOrchestrator>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;

    if req.messages.is_empty() {
        return Err(ApiError::BadRequest("messages cannot be empty".to_string()));
    }

    if req.messages.len() > MAX_MESSAGES {
        return Err(ApiError::BadRequest(format!(
            "too many messages (max {})",
            MAX_MESSAGES
        )));
    }

    let start = Instant::now();
    let mut conversation = req.messages;
    let result = orchestrator.handle(&mut conversation, req.use_tools).await?;

    tracing::info!(
        provider = %result.model_label,
        latency_ms = start.elapsed().as_millis() as u64,
        "Chat request served"
    );

    Ok(Json(result.into()))
}

/// GET /api/tools
pub async fn list_tools(State(orchestrator): State<Arc<ChatOrchestrator>>) -> Json<Vec<ToolSchema>> {
    Json(orchestrator.tools().list_tools())
}

/// POST /api/tools/execute
pub async fn execute_tool(
    State(orchestrator): State<Arc<ChatOrchestrator>>,
    payload: Result<Json<ExecuteToolRequest>, JsonRejection>,
) -> Result<Json<ToolOutcome>, ApiError> {
    let Json(req) = payload?;

    let outcome: ToolOutcome = orchestrator
        .tools()
        .execute(&req.tool, &req.arguments)
        .await
        .into();
    Ok(Json(outcome))
}

/// GET /api/router
pub async fn router_status(
    State(orchestrator): State<Arc<ChatOrchestrator>>,
) -> Json<RouterStatusResponse> {
    let router = orchestrator.router();
    let state = router.state();
    let snapshot = state.snapshot().await;

    Json(RouterStatusResponse {
        credential_index: snapshot.credential_index,
        primary_exhausted: snapshot.primary_exhausted,
        credential_count: state.credential_count(),
        primary: router.primary_label().map(str::to_string),
        fallback: router.fallback_label().map(str::to_string),
        fallback_configured: router.fallback_label().is_some(),
    })
}

/// POST /api/router/reset
pub async fn router_reset(
    State(orchestrator): State<Arc<ChatOrchestrator>>,
) -> Json<RouterStatusResponse> {
    orchestrator.router().reset().await;
    router_status(State(orchestrator)).await
}

/// GET /
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "online".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
    })
}
