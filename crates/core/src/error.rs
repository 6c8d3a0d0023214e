/// Failure returned by [`Operation::run`](crate::Operation::run).
///
/// Every variant describes a problem with the caller's input. None of them
/// indicate a fault in the service itself, so they are always surfaced to the
/// caller as a normal job outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error("input image is empty")]
    EmptyInput,

    /// A parameter was out of range. The message is caller-facing.
    #[error("{0}")]
    InvalidParameter(String),

    #[error("job {0} has already been processed")]
    AlreadyProcessed(u64),
}

impl OperationError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image as png: {0}")]
    Encode(#[source] image::ImageError),
}
