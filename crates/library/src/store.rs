use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use common::MediaItem;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{Catalog, LibraryError};

const CACHE_MAGIC: [u8; 4] = *b"JBXC";
pub const CACHE_VERSION: u32 = 1;
pub const DEFAULT_CACHE_FILE: &str = "catalog.bin";

#[derive(Debug, Serialize, Deserialize)]
struct CacheHeader {
    magic: [u8; 4],
    version: u32,
    synced_at: u64,
    count: u64,
    digest: [u8; 32],
}

/// A relative cache path lives under the library root; a blank one means
/// `DEFAULT_CACHE_FILE`.
pub fn resolve_cache_path(root: &Path, value: &str) -> PathBuf {
    let trimmed = value.trim();
    let raw = Path::new(if trimmed.is_empty() {
        DEFAULT_CACHE_FILE
    } else {
        trimmed
    });
    if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        root.join(raw)
    }
}

#[derive(Clone, Debug)]
pub struct CatalogStore {
    root: PathBuf,
    cache_path: PathBuf,
}

impl CatalogStore {
    pub fn new(root: PathBuf, cache_path: PathBuf) -> Self {
        Self { root, cache_path }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Returns the cached catalog, or `None` when it is stale. Missing,
    /// unreadable and corrupt caches all count as stale.
    pub fn load(&self) -> Option<Catalog> {
        let cache_mtime = match fs::metadata(&self.cache_path).and_then(|meta| meta.modified()) {
            Ok(mtime) => mtime,
            Err(err) => {
                info!("No catalog cache at {:?}: {}", self.cache_path, err);
                return None;
            }
        };
        if let Some(dir) = self.newer_subdirectory(cache_mtime) {
            info!("Catalog cache is older than {:?}", dir);
            return None;
        }
        let bytes = match fs::read(&self.cache_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                info!("Failed to read catalog cache {:?}: {}", self.cache_path, err);
                return None;
            }
        };
        match decode_catalog(&bytes) {
            Ok(catalog) => Some(catalog),
            Err(err) => {
                info!("Discarding catalog cache {:?}: {}", self.cache_path, err);
                None
            }
        }
    }

    /// First visible top-level directory modified after `cache_mtime`.
    /// Directories that cannot be inspected are ignored.
    fn newer_subdirectory(&self, cache_mtime: SystemTime) -> Option<PathBuf> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("Cannot list {:?}: {}", self.root, err);
                return None;
            }
        };
        for entry in entries.filter_map(Result::ok) {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(meta) if meta.is_dir() => meta,
                _ => continue,
            };
            if let Ok(mtime) = meta.modified() {
                if mtime > cache_mtime {
                    return Some(entry.path());
                }
            }
        }
        None
    }

    /// Replaces the cache file. The rename is the only commit point; a
    /// failure before it leaves the previous cache untouched.
    pub fn write(&self, catalog: &Catalog) -> Result<(), LibraryError> {
        let bytes = encode_catalog(catalog)?;
        let dir = match self.cache_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.cache_path).map_err(|err| err.error)?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), self.cache_path);
        Ok(())
    }
}

pub fn encode_catalog(catalog: &Catalog) -> Result<Vec<u8>, LibraryError> {
    let mut payload = Vec::new();
    for item in catalog.items() {
        bincode::serialize_into(&mut payload, item)?;
    }
    let header = CacheHeader {
        magic: CACHE_MAGIC,
        version: CACHE_VERSION,
        synced_at: catalog.synced_at(),
        count: catalog.len() as u64,
        digest: *blake3::hash(&payload).as_bytes(),
    };
    let mut bytes = bincode::serialize(&header)?;
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

pub fn decode_catalog(bytes: &[u8]) -> Result<Catalog, LibraryError> {
    let mut rest = bytes;
    let header: CacheHeader = bincode::deserialize_from(&mut rest)?;
    if header.magic != CACHE_MAGIC {
        return Err(LibraryError::CorruptCache("bad magic".to_string()));
    }
    if header.version != CACHE_VERSION {
        return Err(LibraryError::VersionMismatch(header.version));
    }
    if blake3::hash(rest).as_bytes() != &header.digest {
        return Err(LibraryError::CorruptCache("digest mismatch".to_string()));
    }

    let mut items: Vec<MediaItem> = Vec::new();
    while !rest.is_empty() {
        items.push(bincode::deserialize_from(&mut rest)?);
    }
    if items.len() as u64 != header.count {
        return Err(LibraryError::CorruptCache(format!(
            "expected {} items, found {}",
            header.count,
            items.len()
        )));
    }
    Ok(Catalog::new(items, header.synced_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::build_item;
    use metadata::TagInfo;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sample_catalog() -> Catalog {
        let tags = TagInfo {
            artist: Some("Sigur Rós".to_string()),
            year: Some("1999".to_string()),
            genre: Some("Post-rock".to_string()),
            ..TagInfo::default()
        };
        Catalog::new(
            vec![
                build_item("Sigur Ros/Agaetis byrjun/02 Svefn-g-englar.flac", Some(&tags), "2023-11-30"),
                build_item("AC_DC/Back In Black/1-01 Hells Bells.m4a", None, "2024-03-09"),
                build_item("loose.mp4", None, "2024-03-10"),
            ],
            1_710_000_000,
        )
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    fn set_dir_mtime(path: &Path, time: SystemTime) {
        File::open(path).unwrap().set_modified(time).unwrap();
    }

    #[test]
    fn encode_then_decode_preserves_items() {
        let catalog = sample_catalog();
        let decoded = decode_catalog(&encode_catalog(&catalog).unwrap()).unwrap();
        assert_eq!(decoded.items(), catalog.items());
        assert_eq!(decoded.synced_at(), catalog.synced_at());

        let empty = Catalog::new(Vec::new(), 7);
        let decoded = decode_catalog(&encode_catalog(&empty).unwrap()).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded.synced_at(), 7);
    }

    const WORDS: &[&str] = &[
        "Björk", "Sigur Rós", "Motörhead", "東京事変", "Ελληνικά", "AC_DC", "Café Tacvba",
        "  spaced  ", "x", "Beyoncé", "Zoë", "Ünïcödé", "01", "2-03", "naïve",
    ];

    fn word(rng: &mut StdRng) -> &'static str {
        WORDS[rng.random_range(0..WORDS.len())]
    }

    fn maybe_word(rng: &mut StdRng) -> Option<String> {
        match rng.random_range(0..3) {
            0 => None,
            1 => Some(String::new()),
            _ => Some(word(rng).to_string()),
        }
    }

    fn generated_item(rng: &mut StdRng, index: usize) -> MediaItem {
        let depth = rng.random_range(0..6);
        let mut parts: Vec<String> = (0..depth).map(|_| word(rng).to_string()).collect();
        parts.push(format!("{}-{:02} {} {}.flac", rng.random_range(1..4), index % 100, word(rng), index));
        let pathname = parts.join("/");
        let tags = if rng.random_bool(0.5) {
            Some(TagInfo {
                album: maybe_word(rng),
                artist: maybe_word(rng),
                name: maybe_word(rng),
                disc: None,
                track: maybe_word(rng),
                year: maybe_word(rng),
                genre: maybe_word(rng),
            })
        } else {
            None
        };
        build_item(&pathname, tags.as_ref(), "2024-01-01")
    }

    #[test]
    fn generated_catalogs_survive_encoding() {
        let mut rng = StdRng::seed_from_u64(42);
        for round in 0..20 {
            let count = rng.random_range(0..200);
            let items: Vec<MediaItem> = (0..count).map(|i| generated_item(&mut rng, i)).collect();
            let catalog = Catalog::new(items, round);
            let decoded = decode_catalog(&encode_catalog(&catalog).unwrap()).unwrap();
            assert_eq!(decoded, catalog);
        }
    }

    #[test]
    fn cache_path_defaults_under_root() {
        let root = Path::new("/srv/music");
        assert_eq!(resolve_cache_path(root, ""), root.join("catalog.bin"));
        assert_eq!(resolve_cache_path(root, "catalog.bin"), root.join("catalog.bin"));
        assert_eq!(
            resolve_cache_path(root, "cache/index.bin"),
            PathBuf::from("/srv/music/cache/index.bin")
        );
        assert_eq!(
            resolve_cache_path(root, "/var/cache/catalog.bin"),
            PathBuf::from("/var/cache/catalog.bin")
        );
    }

    #[test]
    fn damaged_bytes_are_rejected() {
        let bytes = encode_catalog(&sample_catalog()).unwrap();

        let mut flipped = bytes.clone();
        let last = flipped.len() - 1;
        flipped[last] ^= 0xff;
        assert!(decode_catalog(&flipped).is_err());

        assert!(decode_catalog(&bytes[..bytes.len() - 5]).is_err());
        assert!(decode_catalog(&bytes[..10]).is_err());
        assert!(decode_catalog(b"").is_err());

        let mut wrong_magic = bytes.clone();
        wrong_magic[0] = b'X';
        assert!(decode_catalog(&wrong_magic).is_err());
    }

    #[test]
    fn write_then_load() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Artist")).unwrap();
        let store = CatalogStore::new(dir.path().to_path_buf(), dir.path().join("catalog.bin"));
        let catalog = sample_catalog();
        store.write(&catalog).unwrap();

        set_mtime(store.cache_path(), SystemTime::now() + Duration::from_secs(3600));
        let loaded = store.load().unwrap();
        assert_eq!(loaded.items(), catalog.items());
    }

    #[test]
    fn newer_subdirectory_makes_cache_stale() {
        let dir = TempDir::new().unwrap();
        let artist = dir.path().join("Artist");
        fs::create_dir(&artist).unwrap();
        let store = CatalogStore::new(dir.path().to_path_buf(), dir.path().join("catalog.bin"));
        store.write(&sample_catalog()).unwrap();

        let now = SystemTime::now();
        set_mtime(store.cache_path(), now - Duration::from_secs(3600));
        set_dir_mtime(&artist, now);
        assert!(store.load().is_none());

        set_dir_mtime(&artist, now - Duration::from_secs(7200));
        assert!(store.load().is_some());
    }

    #[test]
    fn hidden_subdirectories_do_not_count() {
        let dir = TempDir::new().unwrap();
        let hidden = dir.path().join(".cache");
        fs::create_dir(&hidden).unwrap();
        let store = CatalogStore::new(dir.path().to_path_buf(), dir.path().join("catalog.bin"));
        store.write(&sample_catalog()).unwrap();

        let now = SystemTime::now();
        set_mtime(store.cache_path(), now - Duration::from_secs(3600));
        set_dir_mtime(&hidden, now);
        assert!(store.load().is_some());
    }

    #[test]
    fn missing_or_corrupt_cache_is_stale() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path().to_path_buf(), dir.path().join("catalog.bin"));
        assert!(store.load().is_none());

        fs::write(store.cache_path(), b"definitely not a catalog").unwrap();
        set_mtime(store.cache_path(), SystemTime::now() + Duration::from_secs(3600));
        assert!(store.load().is_none());
    }

    #[test]
    fn write_replaces_previous_cache() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path().to_path_buf(), dir.path().join("catalog.bin"));
        store.write(&sample_catalog()).unwrap();
        store.write(&Catalog::new(Vec::new(), 42)).unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.synced_at(), 42);

        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
