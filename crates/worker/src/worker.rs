//! Worker tasks and the pool that owns them.
//!
//! A worker pulls [`JobRequest`]s off the shared queue and runs each job to
//! completion on the blocking thread pool. Cancellation is cooperative: it
//! never interrupts an operation already running, it only decides what
//! happens to the finished result.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::dispatcher::JobDispatcher;
use crate::queue::{self, JobReceiver, JobSender};
use crate::request::JobRequest;

/// Default per-request wait before a dispatch times out.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

/// Run one worker until the queue is closed and drained, or `shutdown` is
/// cancelled.
///
/// Shutdown is checked before each dequeue, so requests still queued when it
/// fires are left for their dispatchers to time out.
pub async fn run_worker(id: usize, receiver: JobReceiver, shutdown: CancellationToken) {
    tracing::debug!(worker_id = id, "Worker started");

    loop {
        let request = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = receiver.next() => match next {
                Some(request) => request,
                None => break,
            },
        };

        if !handle_request(id, request, &shutdown).await {
            break;
        }
    }

    tracing::info!(worker_id = id, "Worker exiting");
}

/// Process one request and deliver or discard its result.
///
/// Returns `false` if the worker was lost and must stop.
async fn handle_request(worker_id: usize, request: JobRequest, shutdown: &CancellationToken) -> bool {
    let JobRequest {
        mut job,
        deadline,
        result_slot,
    } = request;
    let job_id = job.id();
    let operation = job.operation_name();
    tracing::debug!(worker_id, job_id, operation, "Job started");

    let processed = tokio::task::spawn_blocking(move || {
        let result = job.process();
        (job, result)
    })
    .await;

    let (job, result) = match processed {
        Ok(done) => done,
        Err(e) => {
            // Dropping the slot unfilled leaves the dispatcher with an
            // abandoned job.
            tracing::error!(worker_id, job_id, operation, error = %e, "Operation panicked, worker lost");
            return false;
        }
    };

    let elapsed_ms = job.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => tracing::info!(worker_id, job_id, operation, elapsed_ms, "Job completed"),
        Err(e) => tracing::warn!(
            worker_id,
            job_id,
            operation,
            error = %e,
            started_at = ?job.started_at(),
            finished_at = ?job.finished_at(),
            "Job failed",
        ),
    }

    if shutdown.is_cancelled() {
        tracing::info!(worker_id, job_id, "Shutting down, discarding result");
        drop(result);
        return false;
    }

    if deadline.is_expired() {
        tracing::debug!(worker_id, job_id, "Caller deadline passed, discarding result");
        drop(result);
        return true;
    }

    // The caller can still give up between the check and the send; the value
    // then comes back here and is dropped.
    if let Err(unwanted) = result_slot.send(result) {
        tracing::debug!(worker_id, job_id, "Caller gone, discarding result");
        drop(unwanted);
    }
    true
}

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

/// Sizing for a [`WorkerPool`].
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker tasks (at least one).
    pub workers: usize,
    /// Maximum number of queued requests (at least one).
    pub queue_capacity: usize,
    /// How long a dispatch waits for its result.
    pub max_wait: Duration,
}

impl Default for WorkerPoolConfig {
    /// One worker per available core, an equally sized queue, and a 10 s wait.
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            workers,
            queue_capacity: workers,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

/// A fixed set of worker tasks sharing one queue.
///
/// Dropping the pool does not stop the workers; call [`shutdown`](Self::shutdown).
pub struct WorkerPool {
    queue: JobSender,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    workers: usize,
}

impl WorkerPool {
    /// Spawn the workers and return the pool together with a dispatcher
    /// submitting to it. Must be called from within a Tokio runtime.
    pub fn spawn(config: &WorkerPoolConfig) -> (Self, JobDispatcher) {
        let workers = config.workers.max(1);
        let (sender, receiver) = queue::channel(config.queue_capacity);
        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();

        for id in 0..workers {
            tracker.spawn(run_worker(id, receiver.clone(), shutdown.clone()));
        }
        tracker.close();

        tracing::info!(
            workers,
            queue_capacity = sender.capacity(),
            max_wait_ms = config.max_wait.as_millis() as u64,
            "Worker pool started",
        );

        let dispatcher = JobDispatcher::new(sender.clone(), config.max_wait);
        let pool = Self {
            queue: sender,
            shutdown,
            tracker,
            workers,
        };
        (pool, dispatcher)
    }

    /// Number of workers the pool was started with.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of worker tasks still running.
    pub fn live_workers(&self) -> usize {
        self.tracker.len()
    }

    /// The process-wide shutdown signal shared by the workers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop the pool: close the queue, signal the workers, then wait for all
    /// of them to exit.
    ///
    /// Workers finish the job they are running before exiting.
    pub async fn shutdown(&self) {
        if !self.queue.close() {
            tracing::debug!("Job queue already closed");
        }
        self.shutdown.cancel();
        self.tracker.wait().await;
        tracing::info!("Worker pool stopped");
    }
}
