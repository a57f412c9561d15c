/// Job Processing Layer
///
/// Decouples run intake from execution: the API enqueues a `JobRecord` and
/// returns immediately, a pool of workers pulls records off the queue and
/// drives one engine run per record.

// Job record and the bounded in-process queue
pub mod queue;

// Job consumer and worker pool
pub mod worker;

pub use queue::{JobQueue, JobReceiver, JobRecord};
pub use worker::{spawn_workers, JobOutcome, JobStatus, Worker};
