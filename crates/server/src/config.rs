use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use library::scan::{DEFAULT_AUDIO_EXTENSIONS, DEFAULT_VIDEO_EXTENSIONS};
use library::store::DEFAULT_CACHE_FILE;
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_PORT: u16 = 1234;
const DEFAULT_SESSIONS_PATH: &str = "sessions";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub version: u32,
    pub music_root: String,
    pub catalog_file: String,
    pub port: u16,
    pub rebuild_interval_secs: u64,
    pub watch_music: bool,
    pub watch_debounce_secs: u64,
    pub audio_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
    pub require_auth: bool,
    pub sessions_path: String,
    pub random_fallback: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            music_root: "".to_string(),
            catalog_file: DEFAULT_CACHE_FILE.to_string(),
            port: DEFAULT_PORT,
            rebuild_interval_secs: 120,
            watch_music: false,
            watch_debounce_secs: 2,
            audio_extensions: to_strings(DEFAULT_AUDIO_EXTENSIONS),
            video_extensions: to_strings(DEFAULT_VIDEO_EXTENSIONS),
            require_auth: true,
            sessions_path: DEFAULT_SESSIONS_PATH.to_string(),
            random_fallback: true,
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("JUKEBOX_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

/// Reads the config at `path`, writing a default one first if it does not
/// exist. The flag is true when the file was created.
pub fn load_or_create_config(path: &Path) -> Result<(ServerConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ServerConfig = serde_yaml::from_str(&contents)?;
        fill_blanks(&mut config);
        return Ok((config, false));
    }

    let config = ServerConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

fn fill_blanks(config: &mut ServerConfig) {
    let defaults = ServerConfig::default();
    if config.version < CONFIG_VERSION {
        config.version = CONFIG_VERSION;
    }
    if config.port == 0 {
        config.port = DEFAULT_PORT;
    }
    if config.catalog_file.trim().is_empty() {
        config.catalog_file = defaults.catalog_file;
    }
    if config.sessions_path.trim().is_empty() {
        config.sessions_path = defaults.sessions_path;
    }
    if config.watch_debounce_secs == 0 {
        config.watch_debounce_secs = defaults.watch_debounce_secs;
    }
    if config.audio_extensions.is_empty() && config.video_extensions.is_empty() {
        config.audio_extensions = defaults.audio_extensions;
        config.video_extensions = defaults.video_extensions;
    }
}

pub fn save_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

pub fn resolve_music_root(config_path: &Path, value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(resolve_path(config_path, trimmed))
    }
}
