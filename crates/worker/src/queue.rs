//! Bounded many-producer, many-consumer hand-off between dispatchers and
//! workers.
//!
//! The channel is the only structure shared between tasks; no lock guards
//! it. Requests are picked up in submission order.

use crate::error::DispatchError;
use crate::request::JobRequest;

/// Create a queue holding at most `capacity` pending requests.
///
/// A capacity of zero is raised to one.
pub fn channel(capacity: usize) -> (JobSender, JobReceiver) {
    let (sender, receiver) = async_channel::bounded(capacity.max(1));
    (JobSender { inner: sender }, JobReceiver { inner: receiver })
}

/// Submitting half of the queue.
#[derive(Debug, Clone)]
pub struct JobSender {
    inner: async_channel::Sender<JobRequest>,
}

impl JobSender {
    /// Enqueue a request, waiting for space while the queue is full.
    pub async fn enqueue(&self, request: JobRequest) -> Result<(), DispatchError> {
        self.inner
            .send(request)
            .await
            .map_err(|_| DispatchError::QueueClosed)
    }

    /// Close the queue for every sender and receiver.
    ///
    /// Requests already queued can still be received. Returns `false` if the
    /// queue was already closed.
    pub fn close(&self) -> bool {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Number of requests waiting to be picked up.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity().unwrap_or(usize::MAX)
    }
}

/// Consuming half of the queue. Clone one per worker.
#[derive(Debug, Clone)]
pub struct JobReceiver {
    inner: async_channel::Receiver<JobRequest>,
}

impl JobReceiver {
    /// Wait for the next request. `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<JobRequest> {
        self.inner.recv().await.ok()
    }
}
