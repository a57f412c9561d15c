/// In-process job queue
///
/// A bounded tokio mpsc channel. The sending half lives in the API state; the
/// receiving half is shared by every worker behind a mutex so each record is
/// handed to exactly one worker.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// One accepted run request waiting for a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// "exec_" followed by a simple-format UUID v4
    pub run_id: String,
    pub workflow_id: String,
    /// Body of the execute request; becomes the start nodes' input item
    pub trigger_payload: Value,
    pub enqueued_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(workflow_id: impl Into<String>, trigger_payload: Value) -> Self {
        Self {
            run_id: new_run_id(),
            workflow_id: workflow_id.into(),
            trigger_payload,
            enqueued_at: Utc::now(),
        }
    }
}

/// Receiving half shared by the worker pool
pub type JobReceiver = Arc<Mutex<mpsc::Receiver<JobRecord>>>;

/// Sending half of the job queue; cheap to clone
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<JobRecord>,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` waiting jobs
    pub fn bounded(capacity: usize) -> (Self, JobReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, Arc::new(Mutex::new(receiver)))
    }

    /// Queue a run of `workflow_id` and return its run id
    ///
    /// Waits for space when the queue is full; fails only once every worker
    /// has shut down.
    pub async fn enqueue(&self, workflow_id: &str, trigger_payload: Value) -> Result<String> {
        let job = JobRecord::new(workflow_id, trigger_payload);
        let run_id = job.run_id.clone();

        self.sender
            .send(job)
            .await
            .map_err(|_| anyhow::anyhow!("Job queue is closed, no worker is accepting runs"))?;

        tracing::info!("📬 Queued run {} for workflow {}", run_id, workflow_id);
        Ok(run_id)
    }
}

fn new_run_id() -> String {
    format!("exec_{}", uuid::Uuid::new_v4().simple())
}
