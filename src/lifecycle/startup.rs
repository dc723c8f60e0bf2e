//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the initial filter set and start its reload triggers
//! - Start background tasks (event dispatcher, metrics, admin API)
//! - Bind the proxy listener last, so traffic only arrives when ready
//!
//! # Design Decisions
//! - A bad filter source is not fatal: the proxy starts with an empty set
//!   and passes traffic through unclassified until a reload succeeds
//! - A watcher that cannot start is logged and skipped; SIGHUP and the
//!   admin reload endpoint still work without it
//! - Listener and emitter errors are fatal

use std::net::SocketAddr;
use std::sync::Arc;

use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{setup_admin_router, AdminState};
use crate::config::ProxyConfig;
use crate::events::{EmitError, EventEmitter};
use crate::filters::watcher::FilterWatcher;
use crate::filters::{FilterLoader, FilterSet, FilterStore};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::monitor::TrafficMonitor;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start event emitter: {0}")]
    Emitter(#[from] EmitError),

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
}

/// Run the proxy until `shutdown` is triggered (or a signal triggers it).
pub async fn run(config: ProxyConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let loader = FilterLoader::from_config(&config.filters);
    let initial = match loader.load() {
        Ok(set) => set,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load filters; starting with an empty filter set");
            FilterSet::default()
        }
    };
    tracing::info!(filters = initial.len(), "Filters loaded");
    let store = Arc::new(FilterStore::new(initial));

    // Dropping the watcher stops it; keep it for the lifetime of the server.
    let _watcher = if config.filters.watch {
        start_watcher(&loader, &store)
    } else {
        None
    };

    let (emitter, dispatcher) = EventEmitter::new(&config.collector)?;
    let dispatcher_task = tokio::spawn(dispatcher.run(shutdown.subscribe()));

    let monitor = Arc::new(TrafficMonitor::new(store.clone(), emitter, &config.collector.api_key));
    if !monitor.is_enabled() {
        tracing::warn!(
            has_api_key = !config.collector.api_key.trim().is_empty(),
            filters = store.len(),
            "Traffic classification disabled; requests pass through unclassified"
        );
    }

    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));
    tokio::spawn(signals::reload_on_hangup(loader.clone(), store.clone(), shutdown.clone()));

    if config.admin.enabled {
        let admin_listener = bind(&config.admin.bind_address).await?;
        let router = setup_admin_router(AdminState {
            monitor: monitor.clone(),
            loader: loader.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        });
        let mut stop = shutdown.subscribe();
        tracing::info!(address = %config.admin.bind_address, "Admin API listening");
        tokio::spawn(async move {
            let served = axum::serve(admin_listener, router)
                .with_graceful_shutdown(async move {
                    let _ = stop.recv().await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin API stopped with error");
            }
        });
    }

    let listener = bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, monitor);
    let result = server.run(listener, shutdown.subscribe()).await;

    shutdown.trigger();
    let _ = dispatcher_task.await;

    result.map_err(StartupError::Server)
}

fn start_watcher(loader: &FilterLoader, store: &Arc<FilterStore>) -> Option<RecommendedWatcher> {
    let watcher = FilterWatcher::new(loader.clone(), store.clone())?;
    match watcher.run() {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::error!(
                directory = ?loader.directory(),
                error = %e,
                "Failed to watch filter directory; continuing without hot reload"
            );
            None
        }
    }
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address).await.map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}
