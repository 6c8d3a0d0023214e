use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use manip_api::config::{LogFormat, ServerConfig};
use manip_api::router::build_app_router;
use manip_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "manip_api=debug,manip_worker=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }

    tracing::info!(
        host = %config.host,
        port = %config.port,
        workers = config.num_workers,
        queue_capacity = config.queue_capacity,
        job_max_wait_ms = config.job_max_wait_ms,
        "Loaded server configuration",
    );

    let state = AppState::new(config.clone());
    let dispatcher = state.dispatcher.clone();
    let pool = state.pool.clone();

    let app = build_app_router(state, &config);

    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Queue closes before workers are cancelled.
    tracing::info!("Server stopped accepting connections, stopping workers");
    dispatcher.close();

    let timeout = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(timeout, pool.shutdown()).await.is_err() {
        tracing::warn!(
            live_workers = pool.live_workers(),
            timeout_secs = config.shutdown_timeout_secs,
            "Workers did not stop in time",
        );
    }

    tracing::info!("Graceful shutdown complete");
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Ctrl-C received, draining image workers");
        }
        () = terminate => {
            tracing::info!("SIGTERM received, draining image workers");
        }
    }
}
