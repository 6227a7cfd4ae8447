use serde::{Deserialize, Serialize};
use std::path::Path;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const UNKNOWN_ITEM: &str = "Unknown Item";
pub const DEFAULT_NUMBER: &str = "1";

/// Display fields of a media item, before normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemFields {
    pub pathname: String,
    pub album: String,
    pub artist: String,
    pub name: String,
    pub disc: String,
    pub track: String,
    pub year: String,
    pub genre: String,
    pub added: String,
}

/// Search forms of the display fields. Text fields are case-folded with
/// diacritics removed; numeric fields hold only their first run of digits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedFields {
    pub pathname: String,
    pub album: String,
    pub artist: String,
    pub name: String,
    pub disc: String,
    pub track: String,
    pub year: String,
    pub genre: String,
}

impl NormalizedFields {
    fn from_fields(fields: &ItemFields) -> Self {
        Self {
            pathname: normalize_for_search(&fields.pathname),
            album: normalize_for_search(&fields.album),
            artist: normalize_for_search(&fields.artist),
            name: normalize_for_search(&fields.name),
            disc: extract_digits(&fields.disc).to_string(),
            track: extract_digits(&fields.track).to_string(),
            year: extract_digits(&fields.year).to_string(),
            genre: normalize_for_search(&fields.genre),
        }
    }
}

/// One scanned file. Immutable once built; the normalized fields are always
/// derived from the display fields in `new`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pathname: String,
    album: String,
    artist: String,
    name: String,
    disc: String,
    track: String,
    year: String,
    genre: String,
    added: String,
    normalized: NormalizedFields,
}

impl MediaItem {
    pub fn new(fields: ItemFields) -> Self {
        let normalized = NormalizedFields::from_fields(&fields);
        let ItemFields {
            pathname,
            album,
            artist,
            name,
            disc,
            track,
            year,
            genre,
            added,
        } = fields;
        Self {
            pathname,
            album,
            artist,
            name,
            disc,
            track,
            year,
            genre,
            added,
            normalized,
        }
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    pub fn album(&self) -> &str {
        &self.album
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn disc(&self) -> &str {
        &self.disc
    }

    pub fn track(&self) -> &str {
        &self.track
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    /// Coarse ingestion date, `YYYY-MM-DD`.
    pub fn added(&self) -> &str {
        &self.added
    }

    pub fn normalized(&self) -> &NormalizedFields {
        &self.normalized
    }

    pub fn to_fields(&self) -> ItemFields {
        ItemFields {
            pathname: self.pathname.clone(),
            album: self.album.clone(),
            artist: self.artist.clone(),
            name: self.name.clone(),
            disc: self.disc.clone(),
            track: self.track.clone(),
            year: self.year.clone(),
            genre: self.genre.clone(),
            added: self.added.clone(),
        }
    }

    /// Name of the folder holding the item, if it is not at the root.
    pub fn parent_folder(&self) -> Option<&str> {
        let (dir, _) = self.pathname.rsplit_once('/')?;
        Some(dir.rsplit('/').next().unwrap_or(dir))
    }
}

pub fn normalize_for_search(value: &str) -> String {
    value
        .to_lowercase()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .nfc()
        .collect()
}

/// First maximal run of ASCII digits in `value`, or "" when there is none.
pub fn extract_digits(value: &str) -> &str {
    let start = match value.find(|ch: char| ch.is_ascii_digit()) {
        Some(start) => start,
        None => return "",
    };
    let rest = &value[start..];
    let end = rest
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Lower-cased extension of the last path segment, without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// Drops the extension (and its dot) from a basename.
pub fn remove_extension(basename: &str) -> &str {
    match basename.rfind('.') {
        Some(dot) => &basename[..dot],
        None => basename,
    }
}

pub fn relpath_from(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(path_to_slash_string(rel))
}

fn path_to_slash_string(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    parts.join("/")
}
