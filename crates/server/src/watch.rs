use std::path::{Path, PathBuf};
use std::time::Duration;

use library::Library;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::scan::run_rebuild;
use crate::state::AppState;

pub fn configure_watcher(state: &AppState, library: &Library, root: PathBuf) {
    let config = state.config.read().clone();
    if !config.watch_music {
        info!("Watcher disabled (watch_music=false)");
        *state.watcher.write() = None;
        return;
    }

    let watch_debounce_secs = if config.watch_debounce_secs == 0 {
        2
    } else {
        config.watch_debounce_secs
    };
    let watch_debounce = Duration::from_secs(watch_debounce_secs);

    match setup_watcher(state.clone(), library.clone(), root.clone(), watch_debounce) {
        Ok(watcher) => {
            info!(
                "Watching {} for changes (debounce {}s)",
                root.display(),
                watch_debounce.as_secs()
            );
            *state.watcher.write() = Some(watcher);
        }
        Err(err) => {
            warn!("Failed to start watcher: {}", err);
            *state.watcher.write() = None;
        }
    }
}

fn setup_watcher(
    state: AppState,
    library: Library,
    root: PathBuf,
    debounce: Duration,
) -> Result<RecommendedWatcher, Box<dyn std::error::Error>> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        NotifyConfig::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    tokio::spawn(async move {
        watch_loop(state, library, rx, debounce).await;
    });

    Ok(watcher)
}

/// Waits for a relevant event, then for `debounce` of quiet, then rebuilds.
async fn watch_loop(
    state: AppState,
    library: Library,
    mut rx: UnboundedReceiver<Event>,
    debounce: Duration,
) {
    let cache_path = library.cache_path().to_path_buf();
    loop {
        let event = match rx.recv().await {
            Some(event) => event,
            None => break,
        };
        if !is_relevant_event(&event, &cache_path) {
            continue;
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(debounce) => {
                    run_rebuild(&state, library.clone(), "watcher").await;
                    break;
                }
                maybe_event = rx.recv() => {
                    if maybe_event.is_none() {
                        return;
                    }
                }
            }
        }
    }
}

// The cache and its temp files may live under the root; writing them must
// not trigger another rebuild.
fn is_relevant_event(event: &Event, cache_path: &Path) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    kind_matches
        && event
            .paths
            .iter()
            .any(|path| path != cache_path && !is_hidden(path))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn media_changes_are_relevant() {
        let cache = Path::new("/music/catalog.bin");
        assert!(is_relevant_event(
            &event(EventKind::Create(CreateKind::File), "/music/A/B/01 x.mp3"),
            cache
        ));
        assert!(is_relevant_event(
            &event(EventKind::Remove(RemoveKind::Folder), "/music/A/B"),
            cache
        ));
        assert!(!is_relevant_event(
            &event(EventKind::Access(AccessKind::Any), "/music/A/B/01 x.mp3"),
            cache
        ));
    }

    #[test]
    fn cache_writes_are_ignored() {
        let cache = Path::new("/music/catalog.bin");
        assert!(!is_relevant_event(
            &event(EventKind::Modify(ModifyKind::Any), "/music/catalog.bin"),
            cache
        ));
        assert!(!is_relevant_event(
            &event(EventKind::Create(CreateKind::File), "/music/.tmpA1b2C3"),
            cache
        ));
    }
}
