use manip_core::{CodecError, OperationError};

/// Failure returned by [`JobDispatcher::dispatch_job`](crate::JobDispatcher::dispatch_job).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The operation rejected its parameters or input.
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// No result arrived before the request's deadline.
    #[error("job cancelled due to timeout")]
    Timeout,

    /// The queue was closed before the request could be enqueued.
    #[error("job queue is closed")]
    QueueClosed,

    /// The result slot was dropped without a result, e.g. the worker
    /// handling the job was lost.
    #[error("job {job_id} was abandoned before producing a result")]
    Abandoned { job_id: u64 },

    #[error(transparent)]
    Encode(#[from] CodecError),
}

impl DispatchError {
    /// Whether this is the timeout sentinel.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}
