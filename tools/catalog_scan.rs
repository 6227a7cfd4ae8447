use std::env;
use std::path::PathBuf;

use library::store::resolve_cache_path;
use library::{Library, Query, RebuildOutcome, ScanOptions};
use tracing_subscriber::EnvFilter;

/// catalog_scan <music-root> [cache-file] [query]
///
/// A relative cache file is placed under the music root.
///
/// Loads the cache when fresh and rebuilds it otherwise. With `--force` the
/// root is always rescanned. A trailing query prints the matching pathnames.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut force = false;
    let mut positional = Vec::new();
    for arg in env::args().skip(1) {
        if arg == "--force" {
            force = true;
        } else {
            positional.push(arg);
        }
    }
    let mut args = positional.into_iter();
    let music_root = args
        .next()
        .or_else(|| env::var("MUSIC_ROOT").ok())
        .map(PathBuf::from)
        .ok_or("MUSIC_ROOT not set and no path argument")?;
    let cache_path = args
        .next()
        .or_else(|| env::var("CATALOG_FILE").ok())
        .unwrap_or_default();
    let cache_path = resolve_cache_path(&music_root, &cache_path);
    let query = args.next();

    let library = Library::open(music_root, cache_path, ScanOptions::default());
    if force {
        if let RebuildOutcome::AlreadyRunning = library.rebuild()? {
            return Err("rebuild already running".into());
        }
    } else {
        library.load_or_rebuild()?;
    }

    let stats = library.stats().ok_or("no catalog was published")?;
    println!("Catalog: {} items, synced at {}", stats.items, stats.synced_at);

    if let Some(query) = query {
        let items = library.search(&Query::parse(&query));
        for item in &items {
            println!("{}", item.pathname());
        }
        println!("{} matches", items.len());
    }

    Ok(())
}
