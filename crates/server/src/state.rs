use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use axum::http::StatusCode;
use axum::Json;
use common::MediaItem;
use notify::RecommendedWatcher;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::auth::Authorizer;
use crate::config::ServerConfig;
use library::{Library, LibraryStats};

#[derive(Clone)]
pub struct AppState {
    pub library_state: Arc<RwLock<LibraryState>>,
    pub authorizer: Arc<dyn Authorizer>,
    pub config_path: PathBuf,
    pub config: Arc<RwLock<ServerConfig>>,
    pub watcher: Arc<RwLock<Option<RecommendedWatcher>>>,
}

impl AppState {
    pub fn new(
        config_path: PathBuf,
        config: ServerConfig,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            library_state: Arc::new(RwLock::new(LibraryState {
                library: None,
                status: LibraryStatus::Unconfigured,
            })),
            authorizer,
            config_path,
            config: Arc::new(RwLock::new(config)),
            watcher: Arc::new(RwLock::new(None)),
        }
    }

    pub fn library(&self) -> Option<Library> {
        self.library_state.read().library.clone()
    }

    pub fn set_status(&self, status: LibraryStatus) {
        self.library_state.write().status = status;
    }
}

#[derive(Clone)]
pub struct LibraryState {
    pub library: Option<Library>,
    pub status: LibraryStatus,
}

#[derive(Clone, Debug)]
pub enum LibraryStatus {
    Unconfigured,
    Missing(PathBuf),
    Scanning { started: SystemTime },
    Ready(LibraryStats),
    Error(String),
}

impl LibraryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LibraryStatus::Unconfigured => "unconfigured",
            LibraryStatus::Missing(_) => "missing",
            LibraryStatus::Scanning { .. } => "scanning",
            LibraryStatus::Ready(_) => "ready",
            LibraryStatus::Error(_) => "error",
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            LibraryStatus::Unconfigured => Some("music directory must be set".to_string()),
            LibraryStatus::Missing(path) => {
                Some(format!("music directory not found: {}", path.display()))
            }
            LibraryStatus::Scanning { started } => {
                let elapsed = started.elapsed().map(|d| d.as_secs()).unwrap_or(0);
                Some(format!("catalog indexing for {}s", elapsed))
            }
            LibraryStatus::Ready(_) => None,
            LibraryStatus::Error(message) => Some(format!("catalog error: {}", message)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub items: Vec<ItemResponse>,
    pub total: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ItemResponse {
    pub pathname: String,
    pub album: String,
    pub artist: String,
    pub name: String,
    pub disc: String,
    pub track: String,
    pub year: String,
    pub genre: String,
}

impl From<&MediaItem> for ItemResponse {
    fn from(item: &MediaItem) -> Self {
        Self {
            pathname: item.pathname().to_string(),
            album: item.album().to_string(),
            artist: item.artist().to_string(),
            name: item.name().to_string(),
            disc: item.disc().to_string(),
            track: item.track().to_string(),
            year: item.year().to_string(),
            genre: item.genre().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogStatusResponse {
    pub status: &'static str,
    pub message: Option<String>,
    pub items: Option<usize>,
    pub synced_at: Option<u64>,
    pub rebuilding: bool,
    pub scanned: usize,
}

#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub started: bool,
}

pub type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;
