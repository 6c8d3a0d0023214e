use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::job::{Job, JobResult};

/// Expiry used when `now + max_wait` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

// ---------------------------------------------------------------------------
// Deadline
// ---------------------------------------------------------------------------

/// A per-request deadline: a fixed expiry instant plus a token that can fire
/// it early.
///
/// Clones share the token, so cancelling any clone expires all of them.
#[derive(Debug, Clone)]
pub struct Deadline {
    expires_at: Instant,
    token: CancellationToken,
}

impl Deadline {
    /// A deadline that expires `max_wait` from now, capped at a far-future
    /// instant when the sum overflows.
    pub fn after(max_wait: Duration) -> Self {
        let now = Instant::now();
        Self {
            expires_at: now
                .checked_add(max_wait)
                .unwrap_or_else(|| now + FAR_FUTURE),
            token: CancellationToken::new(),
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Whether the expiry has passed or the deadline was cancelled.
    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || Instant::now() >= self.expires_at
    }

    /// Resolves once the deadline expires or is cancelled.
    pub async fn expired(&self) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = tokio::time::sleep_until(self.expires_at) => {}
        }
    }

    /// Expire the deadline now.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A guard that expires the deadline when dropped.
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}

// ---------------------------------------------------------------------------
// JobRequest
// ---------------------------------------------------------------------------

/// A [`Job`] bound to its caller's deadline and a single-shot result slot.
///
/// The slot is a oneshot channel, so depositing a result never waits for a
/// reader and never fails in a way the worker has to handle beyond dropping
/// the value.
#[derive(Debug)]
pub struct JobRequest {
    pub job: Job,
    pub deadline: Deadline,
    pub result_slot: oneshot::Sender<JobResult>,
}

impl JobRequest {
    /// Build a request and return the receiving half of its result slot.
    pub fn new(job: Job, deadline: Deadline) -> (Self, oneshot::Receiver<JobResult>) {
        let (result_slot, receiver) = oneshot::channel();
        let request = Self {
            job,
            deadline,
            result_slot,
        };
        (request, receiver)
    }

    pub fn id(&self) -> u64 {
        self.job.id()
    }
}
