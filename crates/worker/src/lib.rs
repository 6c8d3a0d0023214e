//! Bounded job dispatch for image operations.
//!
//! Many callers submit jobs through a shared [`JobDispatcher`]; a fixed
//! [`WorkerPool`] consumes them from one bounded queue. Every dispatch has
//! its own deadline, and a result nobody is waiting for is dropped by the
//! worker instead of being delivered.
//!
//! Shutdown order is strict: close the queue, cancel the shutdown token,
//! then wait for the workers. [`WorkerPool::shutdown`] does all three.

pub mod dispatcher;
mod enqueue;
pub mod error;
pub mod job;
pub mod queue;
pub mod request;
pub mod worker;

pub use dispatcher::JobDispatcher;
pub use error::DispatchError;
pub use job::{Job, JobResult};
pub use request::{Deadline, JobRequest};
pub use worker::{run_worker, WorkerPool, WorkerPoolConfig, DEFAULT_MAX_WAIT};
