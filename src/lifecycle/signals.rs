//! OS signal handling.
//!
//! # Responsibilities
//! - SIGTERM / Ctrl+C → graceful shutdown
//! - SIGHUP → filter set reload (Unix only)

use std::sync::Arc;

use crate::filters::{FilterLoader, FilterStore};
use crate::lifecycle::Shutdown;

/// Wait for Ctrl+C or SIGTERM, then trigger `shutdown`.
pub async fn shutdown_on_signal(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}

/// Reload filters on every SIGHUP until shutdown.
#[cfg(unix)]
pub async fn reload_on_hangup(loader: FilterLoader, store: Arc<FilterStore>, shutdown: Shutdown) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for SIGHUP; signal reload disabled");
            return;
        }
    };
    let mut stop = shutdown.subscribe();

    loop {
        tokio::select! {
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, reloading filters");
                let loader = loader.clone();
                let store = store.clone();
                // Errors are logged by reload(); the current set stays active.
                let _ = tokio::task::spawn_blocking(move || loader.reload(&store)).await;
            }
            _ = stop.recv() => break,
        }
    }
}

#[cfg(not(unix))]
pub async fn reload_on_hangup(_loader: FilterLoader, _store: Arc<FilterStore>, _shutdown: Shutdown) {}
