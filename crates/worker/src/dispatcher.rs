//! Submission side of the worker pool.
//!
//! [`JobDispatcher::dispatch_job`] enqueues a request and waits for either
//! its result or its deadline, whichever comes first. Each dispatch has its
//! own deadline; there is no retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use manip_core::codec;
use manip_core::{DynamicImage, Operation};

use crate::error::DispatchError;
use crate::job::Job;
use crate::queue::JobSender;
use crate::request::{Deadline, JobRequest};

/// Front door of the worker pool used by request handlers.
///
/// Shared behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct JobDispatcher {
    last_id: AtomicU64,
    queue: JobSender,
    max_wait: Duration,
}

impl JobDispatcher {
    /// Create a dispatcher submitting to `queue`, waiting at most `max_wait`
    /// for each result.
    pub fn new(queue: JobSender, max_wait: Duration) -> Self {
        Self {
            last_id: AtomicU64::new(0),
            queue,
            max_wait,
        }
    }

    /// Next job id. Unique and strictly increasing for this dispatcher,
    /// starting at 1.
    pub fn next_id(&self) -> u64 {
        self.last_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Requests waiting to be picked up by a worker.
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Wrap `operation` and `input` in a job with a fresh id.
    pub fn job(&self, operation: impl Operation, input: DynamicImage) -> Job {
        Job::new(self.next_id(), Box::new(operation), input)
    }

    /// Submit `job` and wait for its PNG-encoded output.
    ///
    /// The deadline starts before the enqueue, so time spent waiting for
    /// queue space counts against it. If this future is dropped before it
    /// resolves, the deadline fires and the worker discards the result.
    pub async fn dispatch_job(&self, job: Job) -> Result<Vec<u8>, DispatchError> {
        let job_id = job.id();
        let deadline = Deadline::after(self.max_wait);
        let _expire_on_exit = deadline.drop_guard();

        let (request, result) = JobRequest::new(job, deadline.clone());
        match tokio::time::timeout_at(deadline.expires_at(), self.queue.enqueue(request)).await {
            Ok(enqueued) => enqueued?,
            Err(_) => {
                tracing::warn!(job_id, "Timed out waiting for queue space");
                return Err(DispatchError::Timeout);
            }
        }

        let image = tokio::select! {
            biased;
            delivered = result => match delivered {
                Ok(outcome) => outcome?,
                Err(_) => return Err(DispatchError::Abandoned { job_id }),
            },
            _ = deadline.expired() => {
                tracing::warn!(job_id, max_wait_ms = self.max_wait.as_millis() as u64, "Job timed out");
                return Err(DispatchError::Timeout);
            }
        };

        Ok(codec::encode_png(&image)?)
    }

    /// Close the queue. No further jobs can be dispatched.
    ///
    /// Meant to be called once, after dispatching has stopped; later calls
    /// only log.
    pub fn close(&self) {
        if !self.queue.close() {
            tracing::warn!("Job queue closed more than once");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use futures::future::join_all;
    use manip_core::{Invert, Morphology, MorphologyKind, OperationError};

    use super::*;
    use crate::worker::{WorkerPool, WorkerPoolConfig};

    fn config(workers: usize, max_wait: Duration) -> WorkerPoolConfig {
        WorkerPoolConfig {
            workers,
            queue_capacity: workers,
            max_wait,
        }
    }

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::new_rgb8(width, height)
    }

    /// Sleeps, then returns a 1x1 image whose red channel is `tag`.
    struct Tagged {
        tag: u8,
        sleep: Duration,
    }

    impl Operation for Tagged {
        fn run(&self, _input: DynamicImage) -> Result<DynamicImage, OperationError> {
            std::thread::sleep(self.sleep);
            let mut out = image::RgbImage::new(1, 1);
            out.put_pixel(0, 0, image::Rgb([self.tag, 0, 0]));
            Ok(DynamicImage::ImageRgb8(out))
        }
    }

    fn decoded_tag(png: &[u8]) -> u8 {
        codec::decode_image(png).unwrap().to_rgb8().get_pixel(0, 0).0[0]
    }

    // -- ids -----------------------------------------------------------------

    #[test]
    fn ids_are_unique_and_increasing_per_dispatcher() {
        let (tx, _rx) = crate::queue::channel(1);
        let first = JobDispatcher::new(tx.clone(), Duration::from_secs(1));
        let second = JobDispatcher::new(tx, Duration::from_secs(1));

        assert_eq!(first.next_id(), 1);
        assert_eq!(first.next_id(), 2);
        assert_eq!(first.job(Invert::new(), blank(1, 1)).id(), 3);
        assert_eq!(second.next_id(), 1);
    }

    // -- outcomes ------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn valid_job_returns_png_bytes() {
        let (pool, dispatcher) = WorkerPool::spawn(&config(2, Duration::from_secs(10)));

        let bytes = dispatcher.enqueue_shuffle(blank(1920, 1080), 64).await.unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));

        pool.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn validation_error_returns_promptly() {
        let (pool, dispatcher) = WorkerPool::spawn(&config(1, Duration::from_secs(30)));

        let started = std::time::Instant::now();
        let err = dispatcher
            .dispatch_job(dispatcher.job(Morphology::new(-1, 3, MorphologyKind::Dilate), blank(8, 8)))
            .await
            .unwrap_err();
        assert_matches!(err, DispatchError::Operation(OperationError::InvalidParameter(_)));
        assert!(started.elapsed() < Duration::from_secs(5));

        let err = dispatcher.enqueue_shuffle(blank(8, 8), 0).await.unwrap_err();
        assert_eq!(err.to_string(), "expected partitions to be greater than 1, got 0");

        pool.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn timeout_does_not_leak_workers() {
        let (pool, dispatcher) = WorkerPool::spawn(&config(2, Duration::from_millis(100)));

        for _ in 0..3 {
            let slow = Tagged { tag: 1, sleep: Duration::from_millis(400) };
            let err = dispatcher.dispatch_job(dispatcher.job(slow, blank(1, 1))).await.unwrap_err();
            assert!(err.is_timeout());
            assert_eq!(err.to_string(), "job cancelled due to timeout");
            assert_eq!(pool.live_workers(), 2);
        }

        // Let the slow jobs finish, then the same dispatcher still works.
        tokio::time::sleep(Duration::from_millis(500)).await;
        let bytes = dispatcher.enqueue_invert(blank(4, 4)).await.unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(pool.live_workers(), 2);

        pool.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_jobs_are_correlated() {
        let (pool, dispatcher) = WorkerPool::spawn(&config(3, Duration::from_secs(20)));
        let dispatcher = Arc::new(dispatcher);

        // More jobs than workers, with uneven run times so completions interleave.
        let calls = (0..24u8).map(|tag| {
            let dispatcher = Arc::clone(&dispatcher);
            async move {
                let op = Tagged {
                    tag,
                    sleep: Duration::from_millis(u64::from(tag % 4) * 10),
                };
                let bytes = dispatcher.dispatch_job(dispatcher.job(op, blank(1, 1))).await.unwrap();
                (tag, decoded_tag(&bytes))
            }
        });
        let outcomes = join_all(calls).await;

        assert_eq!(outcomes.len(), 24);
        for (sent, received) in &outcomes {
            assert_eq!(sent, received);
        }
        let distinct: HashSet<u8> = outcomes.iter().map(|(_, r)| *r).collect();
        assert_eq!(distinct.len(), 24);

        pool.shutdown().await;
    }

    // -- shutdown ------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_with_queued_jobs_finishes_in_bounded_time() {
        let (pool, dispatcher) = WorkerPool::spawn(&WorkerPoolConfig {
            workers: 1,
            queue_capacity: 8,
            max_wait: Duration::from_millis(500),
        });
        let dispatcher = Arc::new(dispatcher);

        let pending: Vec<_> = (0..4u8)
            .map(|tag| {
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move {
                    let op = Tagged { tag, sleep: Duration::from_millis(100) };
                    dispatcher.dispatch_job(dispatcher.job(op, blank(1, 1))).await
                })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(20)).await;

        dispatcher.close();
        tokio::time::timeout(Duration::from_secs(5), pool.shutdown())
            .await
            .expect("workers did not stop");
        assert_eq!(pool.live_workers(), 0);

        // Jobs never picked up are seen by their callers as timeouts; the
        // one in flight is discarded.
        let outcomes: Vec<_> = join_all(pending).await.into_iter().map(|o| o.unwrap()).collect();
        for outcome in &outcomes {
            assert_matches!(
                outcome,
                Err(DispatchError::Timeout | DispatchError::Abandoned { .. } | DispatchError::QueueClosed)
            );
        }
        assert!(outcomes.iter().any(|o| o.as_ref().is_err_and(DispatchError::is_timeout)));
    }

    #[tokio::test]
    async fn dispatch_after_close_is_rejected() {
        let (tx, _rx) = crate::queue::channel(1);
        let dispatcher = JobDispatcher::new(tx, Duration::from_secs(1));
        dispatcher.close();
        dispatcher.close();

        let err = dispatcher.enqueue_invert(blank(2, 2)).await.unwrap_err();
        assert_matches!(err, DispatchError::QueueClosed);
    }

    #[tokio::test]
    async fn full_queue_times_out_on_enqueue() {
        // No workers: the single slot fills and the second dispatch waits.
        let (tx, _rx) = crate::queue::channel(1);
        let dispatcher = Arc::new(JobDispatcher::new(tx, Duration::from_millis(50)));

        let first = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.enqueue_invert(blank(1, 1)).await }
        });
        let second = dispatcher.enqueue_invert(blank(1, 1)).await.unwrap_err();
        assert!(second.is_timeout());
        assert!(first.await.unwrap().unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn dropped_dispatch_expires_its_deadline() {
        let (tx, rx) = crate::queue::channel(1);
        let dispatcher = JobDispatcher::new(tx, Duration::from_secs(60));

        let call = dispatcher.enqueue_invert(blank(1, 1));
        let _ = tokio::time::timeout(Duration::from_millis(20), call).await;

        let request = rx.next().await.unwrap();
        assert!(request.deadline.is_expired());
    }
}
