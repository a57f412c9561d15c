/// Job consumer
///
/// Resolves the workflow named by a job, builds a fresh engine and ledger for
/// it, runs it, and reports the outcome. Run history is not persisted: the
/// outcome is logged and returned, then dropped by the pool.

use crate::credentials::CredentialProvider;
use crate::jobs::queue::{JobReceiver, JobRecord};
use crate::runtime::{ExecutionEngine, RunLedger, StepRegistry};
use crate::workflow::WorkflowRegistry;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum JobStatus {
    Completed,
    Failed { error: String },
}

/// Result of processing one job, including whatever the ledger holds
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub run_id: String,
    pub workflow_id: String,
    #[serde(flatten)]
    pub status: JobStatus,
    pub ledger: RunLedger,
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }
}

/// Shared, read-only collaborators every run needs
pub struct Worker {
    workflows: Arc<WorkflowRegistry>,
    steps: Arc<StepRegistry>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl Worker {
    pub fn new(workflows: Arc<WorkflowRegistry>, steps: Arc<StepRegistry>) -> Self {
        Self {
            workflows,
            steps,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Execute one job to completion
    pub async fn process(&self, job: JobRecord) -> JobOutcome {
        let started = std::time::Instant::now();
        let mut ledger = RunLedger::new();

        let status = match self.run(&job, &mut ledger).await {
            Ok(()) => {
                tracing::info!(
                    "🎉 Run {} of workflow {} completed: {} node(s) in {:?}",
                    job.run_id,
                    job.workflow_id,
                    ledger.len(),
                    started.elapsed()
                );
                JobStatus::Completed
            }
            Err(e) => {
                tracing::error!(
                    "❌ Run {} of workflow {} failed after {:?}: {:#}",
                    job.run_id,
                    job.workflow_id,
                    started.elapsed(),
                    e
                );
                JobStatus::Failed { error: format!("{e:#}") }
            }
        };

        JobOutcome {
            run_id: job.run_id,
            workflow_id: job.workflow_id,
            status,
            ledger,
        }
    }

    async fn run(&self, job: &JobRecord, ledger: &mut RunLedger) -> anyhow::Result<()> {
        let workflow = self
            .workflows
            .get_workflow(&job.workflow_id)
            .ok_or_else(|| anyhow::anyhow!("Workflow not found: {}", job.workflow_id))?;

        let mut engine = ExecutionEngine::from_workflow(&workflow, Arc::clone(&self.steps))?;
        if let Some(credentials) = &self.credentials {
            engine = engine.with_credentials(Arc::clone(credentials));
        }

        engine.run(&job.trigger_payload, ledger).await?;
        Ok(())
    }
}

/// Spawn `concurrency` tasks that process jobs until the queue closes
pub fn spawn_workers(worker: Arc<Worker>, receiver: JobReceiver, concurrency: usize) -> Vec<JoinHandle<()>> {
    let concurrency = concurrency.max(1);
    tracing::info!("👷 Starting {} job worker(s)", concurrency);

    (0..concurrency)
        .map(|worker_id| {
            let worker = Arc::clone(&worker);
            let receiver = Arc::clone(&receiver);

            tokio::spawn(async move {
                loop {
                    // Hold the lock only while waiting, never while running
                    let next = receiver.lock().await.recv().await;
                    let Some(job) = next else { break };

                    let span = tracing::info_span!("job", worker = worker_id, run_id = %job.run_id);
                    worker.process(job).instrument(span).await;
                }
                tracing::debug!("🛑 Worker {} stopped, queue closed", worker_id);
            })
        })
        .collect()
}
