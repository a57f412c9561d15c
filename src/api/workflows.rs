/// Workflow management REST API endpoints
///
/// CRUD operations for workflow definitions. Every write is followed by a
/// registry hot reload, so the next queued run sees the new definition while
/// runs already in flight finish on the one they started with.

use crate::api::AppState;
use crate::workflow::{validate_workflow, types::Workflow};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Response for workflow creation/update operations
#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub id: String,
    pub message: String,
}

pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", get(list_workflows).post(create_workflow))
        .route(
            "/api/workflows/{id}",
            get(get_workflow).put(update_workflow).delete(delete_workflow),
        )
}

/// Create a new workflow
///
/// POST /api/workflows
/// Body: { "id": "...", "name": "...", "nodes": [...], "connections": [...] }
async fn create_workflow(
    State(state): State<AppState>,
    Json(workflow): Json<Workflow>,
) -> Result<(StatusCode, Json<WorkflowResponse>), StatusCode> {
    if let Err(e) = validate_workflow(&workflow) {
        tracing::warn!("❌ Rejected workflow definition: {}", e);
        return Err(StatusCode::BAD_REQUEST);
    }

    match state.storage.create_workflow(&workflow).await {
        Ok(true) => {}
        Ok(false) => return Err(StatusCode::CONFLICT),
        Err(e) => {
            tracing::error!("Failed to save workflow: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    reload(&state, &workflow.id).await?;
    tracing::info!("🔥 Created workflow: {} ({})", workflow.id, workflow.name);

    Ok((
        StatusCode::CREATED,
        Json(WorkflowResponse {
            id: workflow.id.clone(),
            message: format!("Workflow '{}' created successfully", workflow.name),
        }),
    ))
}

/// GET /api/workflows
/// Returns: { "workflows": [{ "id": "...", "name": "...", "nodeCount": 3, ... }] }
async fn list_workflows(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.storage.list_workflows().await {
        Ok(workflows) => Ok(Json(json!({ "workflows": workflows }))),
        Err(e) => {
            tracing::error!("Failed to list workflows: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, StatusCode> {
    match state.storage.get_workflow(&id).await {
        Ok(Some(workflow)) => Ok(Json(workflow)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to get workflow {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Replace an existing workflow; the path id wins over the body id
///
/// PUT /api/workflows/{id}
async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut workflow): Json<Workflow>,
) -> Result<Json<WorkflowResponse>, StatusCode> {
    workflow.id = id;

    if let Err(e) = validate_workflow(&workflow) {
        tracing::warn!("❌ Rejected workflow definition: {}", e);
        return Err(StatusCode::BAD_REQUEST);
    }

    match state.storage.update_workflow(&workflow).await {
        Ok(true) => {}
        Ok(false) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to update workflow: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    reload(&state, &workflow.id).await?;
    tracing::info!("🔥 Hot-reloaded workflow: {} ({})", workflow.id, workflow.name);

    Ok(Json(WorkflowResponse {
        id: workflow.id.clone(),
        message: format!("Workflow '{}' updated successfully", workflow.name),
    }))
}

/// DELETE /api/workflows/{id}
async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.delete_workflow(&id).await {
        Ok(true) => {
            state.registry.remove_workflow(&id);
            tracing::info!("Deleted workflow: {}", id);
            Ok(Json(json!({ "message": "Workflow deleted successfully" })))
        }
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete workflow: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn reload(state: &AppState, id: &str) -> Result<(), StatusCode> {
    state.registry.reload_workflow(id).await.map_err(|e| {
        tracing::error!("Failed to reload workflow {} into registry: {}", id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
