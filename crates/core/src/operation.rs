use image::{DynamicImage, GenericImageView};

use crate::error::OperationError;

/// A unit of image computation.
///
/// Implementations are small values constructed with their parameters
/// already supplied. Parameter validation is deferred to [`run`](Self::run)
/// so that a bad value becomes a job outcome rather than a construction
/// failure.
///
/// `run` is called at most once per instance, from whichever worker picks up
/// the job, and must not rely on state shared with other invocations. It must
/// report invalid input through its `Err` value and never panic for it: a
/// panicking operation costs the pool the worker that ran it.
pub trait Operation: Send + 'static {
    /// Transform `input`, consuming it.
    fn run(&self, input: DynamicImage) -> Result<DynamicImage, OperationError>;

    /// Short name used in log fields.
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<T: Operation + ?Sized> Operation for Box<T> {
    fn run(&self, input: DynamicImage) -> Result<DynamicImage, OperationError> {
        (**self).run(input)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Reject zero-sized inputs.
pub(crate) fn ensure_not_empty(input: &DynamicImage) -> Result<(), OperationError> {
    let (width, height) = input.dimensions();
    if width == 0 || height == 0 {
        return Err(OperationError::EmptyInput);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image_is_rejected() {
        let img = DynamicImage::new_rgb8(0, 10);
        assert_eq!(ensure_not_empty(&img), Err(OperationError::EmptyInput));
    }

    #[test]
    fn non_empty_image_is_accepted() {
        let img = DynamicImage::new_rgb8(1, 1);
        assert!(ensure_not_empty(&img).is_ok());
    }
}
