use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use library::store::resolve_cache_path;
use library::{Library, LibraryStats, RebuildOutcome, ScanOptions};
use tracing::{info, warn};

use crate::state::{AppState, LibraryStatus};
use crate::watch::configure_watcher;

/// Opens the library at `root`, publishes it, then loads or rebuilds its
/// catalog in the background.
pub fn start_index(state: AppState, root: PathBuf) {
    let config = state.config.read().clone();
    let cache_path = resolve_cache_path(&root, &config.catalog_file);
    let options = ScanOptions::new(
        config.audio_extensions.as_slice(),
        config.video_extensions.as_slice(),
    );
    let library = Library::open(root.clone(), cache_path, options);
    {
        let mut guard = state.library_state.write();
        guard.library = Some(library.clone());
        guard.status = LibraryStatus::Scanning {
            started: SystemTime::now(),
        };
    }
    *state.watcher.write() = None;

    tokio::spawn(async move {
        let task_library = library.clone();
        let result = tokio::task::spawn_blocking(move || task_library.load_or_rebuild()).await;
        match result {
            Ok(Ok(scanned)) => {
                let stats = library.stats().unwrap_or(LibraryStats {
                    items: 0,
                    synced_at: 0,
                });
                info!(
                    "Catalog ready: {} items ({})",
                    stats.items,
                    if scanned { "scanned" } else { "from cache" }
                );
                state.set_status(LibraryStatus::Ready(stats));
                configure_watcher(&state, &library, root);
            }
            Ok(Err(err)) => {
                warn!("Catalog load failed: {}", err);
                state.set_status(LibraryStatus::Error(err.to_string()));
            }
            Err(err) => {
                warn!("Catalog load join error: {}", err);
                state.set_status(LibraryStatus::Error(err.to_string()));
            }
        }
    });
}

/// Starts a background rebuild unless one is already running. Returns
/// whether a rebuild was started.
pub fn spawn_rebuild(state: AppState, library: Library, reason: &'static str) -> bool {
    if library.is_rebuilding() {
        info!("Skipping {} rebuild; one is already running", reason);
        return false;
    }
    tokio::spawn(async move {
        run_rebuild(&state, library, reason).await;
    });
    true
}

pub async fn run_rebuild(state: &AppState, library: Library, reason: &str) {
    let result = tokio::task::spawn_blocking(move || library.rebuild()).await;
    match result {
        Ok(Ok(RebuildOutcome::Completed(stats))) => {
            info!("Catalog {} rebuild complete: {} items", reason, stats.items);
            state.set_status(LibraryStatus::Ready(stats));
        }
        Ok(Ok(RebuildOutcome::AlreadyRunning)) => {
            info!("Catalog {} rebuild skipped; one is already running", reason);
        }
        Ok(Err(err)) => {
            warn!("Catalog {} rebuild failed: {}", reason, err);
            state.set_status(LibraryStatus::Error(err.to_string()));
        }
        Err(err) => {
            warn!("Catalog {} rebuild join error: {}", reason, err);
            state.set_status(LibraryStatus::Error(err.to_string()));
        }
    }
}

/// Rebuilds the current library every `interval`. A zero interval disables
/// the timer.
pub fn start_periodic_rebuild(state: AppState, interval: Duration) {
    if interval.is_zero() {
        info!("Periodic rebuild disabled (rebuild_interval_secs=0)");
        return;
    }
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; startup already loads the catalog.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let library = match state.library() {
                Some(library) => library,
                None => continue,
            };
            if library.is_rebuilding() {
                continue;
            }
            run_rebuild(&state, library, "periodic").await;
        }
    });
}

pub fn set_library_missing(state: &AppState, path: PathBuf) {
    let mut guard = state.library_state.write();
    guard.library = None;
    guard.status = LibraryStatus::Missing(path);
}
