/// Run intake endpoint
///
/// Accepts a trigger payload for a known workflow and queues it. The response
/// only confirms the run was accepted; the workers execute it later and the
/// outcome is not reported back over HTTP.

use crate::api::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};

pub fn create_execution_routes() -> Router<AppState> {
    Router::new().route("/api/workflows/{id}/execute", post(execute_workflow))
}

/// Queue a run of a workflow
///
/// POST /api/workflows/{id}/execute
/// Body: any JSON value, becomes the start nodes' input item (empty body = {})
/// Returns: 202 { "message": "Execution accepted", "runId": "exec_..." }
async fn execute_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
    body: String,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    tracing::info!("📥 Execute request received for workflow: {}", workflow_id);
    tracing::debug!("📄 Request body: {}", body);

    // Parse JSON body manually to handle errors gracefully
    let payload: Value = if body.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("❌ Invalid JSON payload for workflow {}: {}", workflow_id, e);
            StatusCode::BAD_REQUEST
        })?
    };

    if !state.registry.contains(&workflow_id) {
        tracing::warn!("❌ Execution requested for unknown workflow: {}", workflow_id);
        return Err(StatusCode::NOT_FOUND);
    }

    let run_id = state.queue.enqueue(&workflow_id, payload).await.map_err(|e| {
        tracing::error!("❌ Failed to queue run for workflow {}: {}", workflow_id, e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Execution accepted", "runId": run_id })),
    ))
}
