use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use common::{extension_of, relpath_from, MediaItem};
use metadata::read_tags_from;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::item::build_item;
use crate::LibraryError;

pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] =
    &["flac", "m4a", "mid", "midi", "mp3", "ogg", "wav", "wave"];
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] =
    &["avi", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "ogv", "webm"];

const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Which files become catalog items. Extensions are compared lower-cased and
/// without the leading dot.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    pub audio_extensions: HashSet<String>,
    pub video_extensions: HashSet<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIO_EXTENSIONS, DEFAULT_VIDEO_EXTENSIONS)
    }
}

impl ScanOptions {
    pub fn new<A, V>(audio: &[A], video: &[V]) -> Self
    where
        A: AsRef<str>,
        V: AsRef<str>,
    {
        Self {
            audio_extensions: extension_set(audio),
            video_extensions: extension_set(video),
        }
    }

    fn kind_of(&self, path: &Path) -> Option<MediaKind> {
        let ext = extension_of(path)?;
        if self.audio_extensions.contains(&ext) {
            Some(MediaKind::Audio)
        } else if self.video_extensions.contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

fn extension_set<S: AsRef<str>>(values: &[S]) -> HashSet<String> {
    values
        .iter()
        .map(|value| value.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MediaKind {
    Audio,
    Video,
}

/// Per-file problems are logged and skipped; only an unreadable root fails.
/// `progress` receives the running item count at most once per second.
pub fn scan_tree(
    root: &Path,
    options: &ScanOptions,
    progress: &mut dyn FnMut(usize),
) -> Result<Vec<MediaItem>, LibraryError> {
    fs::read_dir(root).map_err(|err| LibraryError::RootUnreadable(root.to_path_buf(), err))?;

    let started = Instant::now();
    let mut last_report = Instant::now();
    let mut items = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(LibraryError::Walk(err)),
            Err(err) => {
                warn!("Skipping unreadable entry: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let kind = match options.kind_of(entry.path()) {
            Some(kind) => kind,
            None => continue,
        };
        if let Some(item) = scan_file(root, &entry, kind) {
            items.push(item);
        }
        if last_report.elapsed() >= PROGRESS_INTERVAL {
            progress(items.len());
            last_report = Instant::now();
        }
    }

    info!(
        "Scanned {} items under {:?} in {:.1}s",
        items.len(),
        root,
        started.elapsed().as_secs_f64()
    );
    Ok(items)
}

fn scan_file(root: &Path, entry: &DirEntry, kind: MediaKind) -> Option<MediaItem> {
    let path = entry.path();
    let meta = match entry.metadata() {
        Ok(meta) => meta,
        Err(err) => {
            warn!("Failed to stat {:?}: {}", path, err);
            return None;
        }
    };
    if meta.len() == 0 {
        debug!("Skipping empty file {:?}", path);
        return None;
    }
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!("Failed to open {:?}: {}", path, err);
            return None;
        }
    };
    let pathname = relpath_from(root, path)?;

    let tags = match kind {
        MediaKind::Audio => match read_tags_from(file) {
            Ok(tags) => Some(tags),
            Err(err) => {
                debug!("No usable tags in {:?}: {}", path, err);
                None
            }
        },
        MediaKind::Video => None,
    };

    let added = added_date(meta.modified().unwrap_or(SystemTime::UNIX_EPOCH));
    Some(build_item(&pathname, tags.as_ref(), &added))
}

fn is_hidden(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.is_empty() || name.starts_with('.')
}

pub fn added_date(time: SystemTime) -> String {
    let date = OffsetDateTime::from(time).date();
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
