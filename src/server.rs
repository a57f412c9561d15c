/// Server setup and initialization
///
/// Wires together all components: SQLite pool, workflow storage and registry,
/// credential vault and store, step catalog, job queue with its worker pool,
/// and the HTTP routes.

use crate::{
    api::{create_router, AppState},
    config::Config,
    credentials::{CredentialProvider, CredentialStore, CredentialVault},
    jobs::{spawn_workers, JobQueue, Worker},
    steps,
    workflow::{WorkflowRegistry, WorkflowStorage},
};
use anyhow::{Context, Result};
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::sync::Arc;
use tokio::{net::TcpListener, task::JoinHandle};
use tracing_subscriber::EnvFilter;

/// A fully wired application: the router plus the workers draining its queue
pub struct App {
    pub router: Router,
    pub workers: Vec<JoinHandle<()>>,
}

/// Build every component from `config`
///
/// Fails fast when the encryption key is missing or not 32 bytes, before any
/// route is served.
pub async fn create_app(config: Config) -> Result<App> {
    let key = config
        .security
        .encryption_key
        .as_deref()
        .context("STEPFLOW_ENCRYPTION_KEY must be set to a 32-byte secret")?;
    let vault = Arc::new(CredentialVault::from_secret(key).context("Invalid STEPFLOW_ENCRYPTION_KEY")?);

    tracing::info!("📁 Ensuring data directory exists: {}", config.database.data_dir);
    std::fs::create_dir_all(&config.database.data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;

    let db_path = config.database.database_path();
    tracing::info!("🗄️ Opening database: {}", db_path.display());
    let options = SqliteConnectOptions::new().filename(&db_path).create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    build_app(pool, vault, &config).await
}

/// Wire the application on an existing pool; used by `create_app` and tests
pub async fn build_app(pool: SqlitePool, vault: Arc<CredentialVault>, config: &Config) -> Result<App> {
    tracing::info!("📋 Initializing workflow storage");
    let storage = WorkflowStorage::new(pool.clone());
    storage.init_schema().await?;

    tracing::info!("🔐 Initializing credential store");
    let credentials = CredentialStore::new(pool, vault);
    credentials.init_schema().await?;

    tracing::info!("📊 Loading workflows into registry");
    let registry = Arc::new(WorkflowRegistry::new(storage.clone()));
    registry
        .init_from_storage()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load workflows from storage: {}", e))?;

    let steps = Arc::new(steps::catalog(&config.runtime)?);

    let (queue, receiver) = JobQueue::bounded(config.runtime.queue_capacity);
    let provider: Arc<dyn CredentialProvider> = Arc::new(credentials.clone());
    let worker = Worker::new(Arc::clone(&registry), Arc::clone(&steps)).with_credentials(provider);
    let workers = spawn_workers(Arc::new(worker), receiver, config.runtime.worker_concurrency);

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let router = create_router(AppState {
        storage,
        registry,
        steps,
        credentials,
        queue,
    });

    tracing::info!("✅ Application initialized successfully");
    Ok(App { router, workers })
}

/// Start the HTTP server and run until Ctrl-C/SIGTERM
///
/// After the listener stops, the router (and with it the queue sender) is
/// dropped, so workers finish the jobs already queued and exit.
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting stepflow server...");

    let App { router, workers } = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("🛑 HTTP server stopped, draining job queue");
    for handle in workers {
        if let Err(e) = handle.await {
            tracing::error!("❌ Worker task ended abnormally: {}", e);
        }
    }
    tracing::info!("👋 Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("📴 Shutdown signal received");
}
