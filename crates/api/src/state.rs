use std::sync::Arc;

use manip_worker::{JobDispatcher, WorkerPool};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Submission side of the worker pool.
    pub dispatcher: Arc<JobDispatcher>,
    /// The worker pool itself (health reporting and shutdown).
    pub pool: Arc<WorkerPool>,
}

impl AppState {
    /// Spawn a worker pool sized by `config` and wrap it in fresh state.
    pub fn new(config: ServerConfig) -> Self {
        let (pool, dispatcher) = WorkerPool::spawn(&config.worker_pool_config());
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            pool: Arc::new(pool),
        }
    }
}
