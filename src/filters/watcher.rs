//! Filter directory watcher for hot reload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::filters::{FilterLoader, FilterStore};

/// Watches the filter directory and swaps a freshly loaded set into the
/// store whenever a filter file is created, modified or removed.
pub struct FilterWatcher {
    path: PathBuf,
    loader: FilterLoader,
    store: Arc<FilterStore>,
}

impl FilterWatcher {
    /// Returns `None` when the loader has no directory to watch.
    pub fn new(loader: FilterLoader, store: Arc<FilterStore>) -> Option<Self> {
        let path = loader.directory()?.to_path_buf();
        Some(Self { path, loader, store })
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, loader, store } = self;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        tracing::info!(paths = ?event.paths, "Filter change detected, reloading...");
                        // Errors are logged by reload(); the current set stays active.
                        let _ = loader.reload(&store);
                    }
                }
                Err(e) => tracing::error!("Filter watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Filter watcher started");
        Ok(watcher)
    }
}
