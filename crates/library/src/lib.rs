use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use common::MediaItem;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

pub mod item;
pub mod matcher;
pub mod pathname;
pub mod query;
pub mod scan;
pub mod store;

pub use query::{Clause, Query};
pub use scan::ScanOptions;
pub use store::CatalogStore;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<MediaItem>,
    synced_at: u64,
}

impl Catalog {
    pub fn new(items: Vec<MediaItem>, synced_at: u64) -> Self {
        Self { items, synced_at }
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    // Unix seconds
    pub fn synced_at(&self) -> u64 {
        self.synced_at
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn search(&self, query: &Query) -> Vec<&MediaItem> {
        matcher::filter(&self.items, query.clauses())
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct LibraryStats {
    pub items: usize,
    pub synced_at: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RebuildOutcome {
    Completed(LibraryStats),
    AlreadyRunning,
}

#[derive(Clone)]
pub struct Library {
    inner: Arc<LibraryInner>,
}

struct LibraryInner {
    root: PathBuf,
    store: CatalogStore,
    options: ScanOptions,
    catalog: RwLock<Option<Arc<Catalog>>>,
    rebuilding: AtomicBool,
    scanned: AtomicUsize,
    #[cfg(test)]
    walks: AtomicUsize,
    #[cfg(test)]
    before_walk: parking_lot::Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
}

impl Library {
    pub fn open(root: PathBuf, cache_path: PathBuf, options: ScanOptions) -> Self {
        let store = CatalogStore::new(root.clone(), cache_path);
        Self {
            inner: Arc::new(LibraryInner {
                root,
                store,
                options,
                catalog: RwLock::new(None),
                rebuilding: AtomicBool::new(false),
                scanned: AtomicUsize::new(0),
                #[cfg(test)]
                walks: AtomicUsize::new(0),
                #[cfg(test)]
                before_walk: parking_lot::Mutex::new(None),
            }),
        }
    }

    pub fn load(&self) -> bool {
        match self.inner.store.load() {
            Some(catalog) => {
                info!(
                    "Loaded {} items from {:?}",
                    catalog.len(),
                    self.inner.store.cache_path()
                );
                self.publish(catalog);
                true
            }
            None => false,
        }
    }

    pub fn load_or_rebuild(&self) -> Result<bool, LibraryError> {
        if self.load() {
            return Ok(false);
        }
        warn!("Catalog cache missing or stale; scanning {:?}", self.inner.root);
        match self.rebuild()? {
            RebuildOutcome::Completed(_) => Ok(true),
            RebuildOutcome::AlreadyRunning => Ok(false),
        }
    }

    pub fn rebuild(&self) -> Result<RebuildOutcome, LibraryError> {
        let _guard = match RebuildGuard::acquire(&self.inner.rebuilding) {
            Some(guard) => guard,
            None => {
                info!("Rebuild already in progress");
                return Ok(RebuildOutcome::AlreadyRunning);
            }
        };

        #[cfg(test)]
        {
            self.inner.walks.fetch_add(1, Ordering::Relaxed);
            if let Some(hook) = self.inner.before_walk.lock().as_ref() {
                hook();
            }
        }
        self.inner.scanned.store(0, Ordering::Relaxed);
        let scanned = &self.inner.scanned;
        let items = scan::scan_tree(&self.inner.root, &self.inner.options, &mut |count| {
            info!("Scanned {} items so far", count);
            scanned.store(count, Ordering::Relaxed);
        })?;
        self.inner.scanned.store(items.len(), Ordering::Relaxed);

        let catalog = Catalog::new(items, now_secs());
        self.inner.store.write(&catalog)?;
        let stats = LibraryStats {
            items: catalog.len(),
            synced_at: catalog.synced_at(),
        };
        self.publish(catalog);
        info!("Catalog rebuilt with {} items", stats.items);
        Ok(RebuildOutcome::Completed(stats))
    }

    pub fn snapshot(&self) -> Option<Arc<Catalog>> {
        self.inner.catalog.read().clone()
    }

    pub fn search(&self, query: &Query) -> Vec<MediaItem> {
        match self.snapshot() {
            Some(catalog) => catalog.search(query).into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn stats(&self) -> Option<LibraryStats> {
        self.snapshot().map(|catalog| LibraryStats {
            items: catalog.len(),
            synced_at: catalog.synced_at(),
        })
    }

    pub fn is_rebuilding(&self) -> bool {
        self.inner.rebuilding.load(Ordering::Acquire)
    }

    pub fn scanned(&self) -> usize {
        self.inner.scanned.load(Ordering::Relaxed)
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn cache_path(&self) -> &Path {
        self.inner.store.cache_path()
    }

    fn publish(&self, catalog: Catalog) {
        *self.inner.catalog.write() = Some(Arc::new(catalog));
    }
}

struct RebuildGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RebuildGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[derive(Debug)]
pub enum LibraryError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    Walk(walkdir::Error),
    RootUnreadable(PathBuf, std::io::Error),
    CorruptCache(String),
    VersionMismatch(u32),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(err) => write!(f, "io error: {}", err),
            LibraryError::Bincode(err) => write!(f, "bincode error: {}", err),
            LibraryError::Walk(err) => write!(f, "walk error: {}", err),
            LibraryError::RootUnreadable(root, err) => {
                write!(f, "library root {:?} is unreadable: {}", root, err)
            }
            LibraryError::CorruptCache(reason) => write!(f, "corrupt catalog cache: {}", reason),
            LibraryError::VersionMismatch(version) => {
                write!(f, "catalog cache version mismatch: {}", version)
            }
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err)
    }
}

impl From<Box<bincode::ErrorKind>> for LibraryError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        LibraryError::Bincode(err)
    }
}

impl From<walkdir::Error> for LibraryError {
    fn from(err: walkdir::Error) -> Self {
        LibraryError::Walk(err)
    }
}
