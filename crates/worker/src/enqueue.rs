//! One convenience method per operation: build the operation, wrap it in a
//! job and dispatch it.

use manip_core::{
    AddText, DynamicImage, EdgeDetect, Invert, Morphology, MorphologyKind, Operation,
    RandomFilter, Reduce, Saturate, Shuffle,
};

use crate::dispatcher::JobDispatcher;
use crate::error::DispatchError;

impl JobDispatcher {
    async fn submit(
        &self,
        operation: impl Operation,
        image: DynamicImage,
    ) -> Result<Vec<u8>, DispatchError> {
        self.dispatch_job(self.job(operation, image)).await
    }

    pub async fn enqueue_invert(&self, image: DynamicImage) -> Result<Vec<u8>, DispatchError> {
        self.submit(Invert::new(), image).await
    }

    pub async fn enqueue_saturate(
        &self,
        image: DynamicImage,
        value: f32,
    ) -> Result<Vec<u8>, DispatchError> {
        self.submit(Saturate::new(value), image).await
    }

    pub async fn enqueue_edge_detection(
        &self,
        image: DynamicImage,
        lower: f32,
        higher: f32,
    ) -> Result<Vec<u8>, DispatchError> {
        self.submit(EdgeDetect::new(lower, higher), image).await
    }

    pub async fn enqueue_morphology(
        &self,
        image: DynamicImage,
        kernel_size: i32,
        iterations: i32,
        kind: MorphologyKind,
    ) -> Result<Vec<u8>, DispatchError> {
        self.submit(Morphology::new(kernel_size, iterations, kind), image)
            .await
    }

    pub async fn enqueue_reduce(
        &self,
        image: DynamicImage,
        quality: f32,
    ) -> Result<Vec<u8>, DispatchError> {
        self.submit(Reduce::new(quality), image).await
    }

    pub async fn enqueue_add_text(
        &self,
        image: DynamicImage,
        text: impl Into<String>,
        font_scale: f64,
        x: f64,
        y: f64,
    ) -> Result<Vec<u8>, DispatchError> {
        self.submit(AddText::new(text, font_scale, x, y), image)
            .await
    }

    pub async fn enqueue_random_filter(
        &self,
        image: DynamicImage,
        kernel_size: i32,
        min: i32,
        max: i32,
        normalize: bool,
    ) -> Result<Vec<u8>, DispatchError> {
        self.submit(RandomFilter::new(kernel_size, min, max, normalize), image)
            .await
    }

    pub async fn enqueue_shuffle(
        &self,
        image: DynamicImage,
        partitions: i32,
    ) -> Result<Vec<u8>, DispatchError> {
        self.submit(Shuffle::new(partitions), image).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use manip_core::{codec, OperationError};

    use super::*;
    use crate::worker::{WorkerPool, WorkerPoolConfig};

    fn pool() -> (WorkerPool, JobDispatcher) {
        WorkerPool::spawn(&WorkerPoolConfig {
            workers: 2,
            queue_capacity: 4,
            max_wait: Duration::from_secs(20),
        })
    }

    fn photo() -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_fn(32, 24, |x, y| {
            image::Rgb([(x * 8) as u8, (y * 10) as u8, 128])
        }))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn every_operation_produces_a_png() {
        let (pool, d) = pool();

        let outputs = vec![
            d.enqueue_invert(photo()).await,
            d.enqueue_saturate(photo(), 1.5).await,
            d.enqueue_edge_detection(photo(), 50.0, 150.0).await,
            d.enqueue_morphology(photo(), 3, 2, MorphologyKind::Erode).await,
            d.enqueue_reduce(photo(), 0.5).await,
            d.enqueue_add_text(photo(), "hello", 1.0, 0.1, 0.9).await,
            d.enqueue_random_filter(photo(), 3, -2, 2, true).await,
            d.enqueue_shuffle(photo(), 4).await,
        ];
        for output in outputs {
            let bytes = output.unwrap();
            assert!(codec::decode_image(&bytes).is_ok());
        }

        pool.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn invalid_parameters_surface_as_operation_errors() {
        let (pool, d) = pool();

        assert_matches!(
            d.enqueue_saturate(photo(), 0.0).await,
            Err(DispatchError::Operation(OperationError::InvalidParameter(_)))
        );
        assert_matches!(
            d.enqueue_add_text(photo(), "", 1.0, 0.5, 0.5).await,
            Err(DispatchError::Operation(OperationError::InvalidParameter(_)))
        );
        assert_matches!(
            d.enqueue_invert(DynamicImage::new_rgb8(0, 0)).await,
            Err(DispatchError::Operation(OperationError::EmptyInput))
        );

        pool.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn extreme_parameters_leave_the_pool_intact() {
        let (pool, d) = pool();
        let tiny = || DynamicImage::new_rgb8(4, 4);

        for _ in 0..pool.workers() + 1 {
            assert_matches!(
                d.enqueue_random_filter(tiny(), i32::MAX, 0, 1, false).await,
                Err(DispatchError::Operation(OperationError::InvalidParameter(_)))
            );
        }
        for _ in 0..pool.workers() + 1 {
            assert!(d.enqueue_add_text(tiny(), "a", 1e30, 0.5, 0.5).await.is_ok());
        }

        assert_eq!(pool.live_workers(), pool.workers());
        assert!(d.enqueue_invert(photo()).await.is_ok());

        pool.shutdown().await;
    }
}
