/// Credential management endpoints
///
/// Secrets are encrypted by the vault before they reach the database and are
/// never returned over HTTP; listing exposes names only.

use crate::api::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Request body for storing a credential
#[derive(Debug, Deserialize)]
pub struct SaveCredentialRequest {
    pub name: String,
    pub data: Value,
}

pub fn create_credential_routes() -> Router<AppState> {
    Router::new()
        .route("/api/credentials", get(list_credentials).post(save_credential))
        .route("/api/credentials/{name}", delete(delete_credential))
}

/// POST /api/credentials
/// Body: { "name": "github", "data": { "token": "..." } }
async fn save_credential(
    State(state): State<AppState>,
    Json(payload): Json<SaveCredentialRequest>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    state.credentials.save(name, &payload.data).await.map_err(|e| {
        tracing::error!("❌ Failed to store credential '{}': {}", name, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    tracing::info!("🔐 Stored credential: {}", name);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "name": name, "message": "Credential stored" })),
    ))
}

/// GET /api/credentials
/// Returns: { "credentials": ["github", "slack"] }
async fn list_credentials(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.credentials.list_names().await {
        Ok(names) => Ok(Json(json!({ "credentials": names }))),
        Err(e) => {
            tracing::error!("Failed to list credentials: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// DELETE /api/credentials/{name}
async fn delete_credential(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.credentials.delete(&name).await {
        Ok(true) => {
            tracing::info!("🗑️ Deleted credential: {}", name);
            Ok(Json(json!({ "message": "Credential deleted successfully" })))
        }
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete credential {}: {}", name, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
