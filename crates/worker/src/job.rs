//! A single unit of work: an operation bound to its input image.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use manip_core::{DynamicImage, Operation, OperationError};

/// Outcome of [`Job::process`]: the produced image or the operation's error.
pub type JobResult = Result<DynamicImage, OperationError>;

/// An [`Operation`] plus its input and execution bookkeeping.
///
/// `process` may run at most once. Before it runs, `started_at` and
/// `finished_at` are `None` and `elapsed` is zero. Afterwards
/// `finished_at - started_at == elapsed`.
pub struct Job {
    id: u64,
    operation: Box<dyn Operation>,
    input: Option<DynamicImage>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    elapsed: Duration,
}

impl Job {
    pub fn new(id: u64, operation: Box<dyn Operation>, input: DynamicImage) -> Self {
        Self {
            id,
            operation,
            input: Some(input),
            started_at: None,
            finished_at: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Run the operation on the input, recording timestamps around the call
    /// whatever its outcome.
    ///
    /// A second call returns [`OperationError::AlreadyProcessed`] without
    /// touching the recorded timings.
    pub fn process(&mut self) -> JobResult {
        let input = self
            .input
            .take()
            .ok_or(OperationError::AlreadyProcessed(self.id))?;

        let started_at = Utc::now();
        let clock = Instant::now();
        let result = self.operation.run(input);
        self.elapsed = clock.elapsed();

        // Derive the end from the monotonic clock so wall-clock steps can't
        // make it precede the start.
        let elapsed = chrono::Duration::from_std(self.elapsed).unwrap_or(chrono::Duration::zero());
        self.started_at = Some(started_at);
        self.finished_at = Some(started_at + elapsed);
        result
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn operation_name(&self) -> &'static str {
        self.operation.name()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("operation", &self.operation.name())
            .field("processed", &self.input.is_none())
            .field("started_at", &self.started_at)
            .field("finished_at", &self.finished_at)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}
