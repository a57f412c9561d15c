/// HTTP API Layer
///
/// REST endpoints around the execution engine:
/// - Run intake (enqueue only, the workers execute)
/// - Workflow CRUD with hot reload
/// - Step catalog descriptions for the visual builder
/// - Credential management

// Workflow management endpoints (POST/GET/PUT/DELETE)
pub mod workflows;

// Run intake endpoint
pub mod executions;

// Step catalog for the visual builder
pub mod nodes;

// Encrypted credential management
pub mod credentials;

use crate::credentials::CredentialStore;
use crate::jobs::JobQueue;
use crate::runtime::StepRegistry;
use crate::workflow::{WorkflowRegistry, WorkflowStorage};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use credentials::create_credential_routes;
pub use executions::create_execution_routes;
pub use nodes::create_node_routes;
pub use workflows::create_workflow_routes;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Workflow storage for persistence
    pub storage: WorkflowStorage,
    /// Hot-reload registry for in-memory workflows
    pub registry: Arc<WorkflowRegistry>,
    /// Registered step types
    pub steps: Arc<StepRegistry>,
    /// Encrypted credential tokens
    pub credentials: CredentialStore,
    /// Intake side of the job queue
    pub queue: JobQueue,
}

/// Full application router with CORS enabled for the visual builder
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(create_workflow_routes())
        .merge(create_execution_routes())
        .merge(create_node_routes())
        .merge(create_credential_routes())
        .route("/healthz", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness check
async fn health_check() -> &'static str {
    "ok"
}
