//! Warmcache - An adaptive caching and prefetch engine
//!
//! Serves the cache over HTTP and keeps it warm in the background.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warmcache::api::create_router;
use warmcache::optimizer::HttpFetcher;
use warmcache::{spawn_cleanup_task, spawn_warmup_task, AppState, CacheWarmer, Config};

/// Main entry point for the Warmcache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache manager and warmer
/// 4. Start prefetch workers, TTL cleanup and warmup tasks
/// 5. Serve the HTTP API on the configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warmcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Warmcache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_size={}B, max_entries={}, policy={}, prefetch_concurrency={}, port={}",
        config.max_size_bytes,
        config.max_entries,
        config.eviction_policy,
        config.prefetch_concurrency,
        config.server_port
    );

    let fetcher = HttpFetcher::new(config.request_timeout()).context("creating HTTP fetcher")?;
    let state = AppState::from_config(&config, Arc::new(fetcher));
    info!("Cache manager initialized");

    let mut handles = state.warmer.spawn_workers();
    handles.push(spawn_cleanup_task(
        state.manager.clone(),
        config.cleanup_interval(),
    ));
    handles.push(spawn_warmup_task(
        state.warmer.clone(),
        config.warmup_interval(),
    ));
    info!("Background tasks started");

    let warmer = state.warmer.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(warmer, handles))
        .await
        .context("serving HTTP")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown, drops queued prefetches and aborts the background tasks.
async fn shutdown_signal(warmer: CacheWarmer, handles: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    warmer.shutdown();
    for handle in &handles {
        handle.abort();
    }
    warn!("Background tasks aborted");
}
