/// stepflow server entry point
///
/// Reads configuration from the environment and starts the HTTP server with:
/// - Run intake at POST /api/workflows/{id}/execute
/// - Workflow management API at /api/workflows/*
/// - Step catalog at /api/nodes and credentials at /api/credentials
/// - Health check at /healthz

use stepflow::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // STEPFLOW_* environment variables override the defaults
    let config = Config::default();

    start_server(config).await
}
