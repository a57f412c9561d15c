/// Step catalog endpoint
///
/// Lists every registered step type with the metadata the visual builder
/// needs to draw its palette and properties forms.

use crate::api::AppState;
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};

pub fn create_node_routes() -> Router<AppState> {
    Router::new().route("/api/nodes", get(list_nodes))
}

/// GET /api/nodes
/// Returns: { "nodes": [{ "type": "code", "description": { "name": "Code", ... } }] }
async fn list_nodes(State(state): State<AppState>) -> Json<Value> {
    let nodes: Vec<Value> = state
        .steps
        .descriptions()
        .into_iter()
        .map(|(key, description)| json!({ "type": key, "description": description }))
        .collect();

    Json(json!({ "nodes": nodes }))
}
