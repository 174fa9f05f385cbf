use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use launchpad_core::{DEFAULT_LANGUAGE, LanguageId};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

/// Upper bound on any file this module reads.
///
/// Saved lists are small; a larger file is corrupt or not ours.
pub const MAX_STORE_BYTES: u64 = 1024 * 1024;

pub const DATA_DIR_ENV: &str = "LAUNCHPAD_DATA_DIR";
pub const SAVED_SERVERS_FILE: &str = "saved-servers.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const CLIENTS_FILE: &str = "clients.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_language")]
    pub language: LanguageId,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

fn default_language() -> LanguageId {
    DEFAULT_LANGUAGE.to_owned()
}

#[derive(Debug)]
pub enum StoreLoadError {
    Metadata(io::Error),
    TooLarge { size: u64, max: u64 },
    Read(io::Error),
    Parse(serde_json::Error),
}

impl StoreLoadError {
    /// The file simply does not exist yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreLoadError::Metadata(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

impl std::fmt::Display for StoreLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreLoadError::Metadata(e) => write!(f, "metadata read failed: {e}"),
            StoreLoadError::TooLarge { size, max } => {
                write!(f, "file too large: {size} bytes (max {max})")
            }
            StoreLoadError::Read(e) => write!(f, "read failed: {e}"),
            StoreLoadError::Parse(e) => write!(f, "parse failed: {e}"),
        }
    }
}

impl std::error::Error for StoreLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreLoadError::Metadata(e) => Some(e),
            StoreLoadError::Read(e) => Some(e),
            StoreLoadError::Parse(e) => Some(e),
            StoreLoadError::TooLarge { .. } => None,
        }
    }
}

#[derive(Debug)]
pub enum StoreSaveError {
    CreateDir(io::Error),
    Serialize(serde_json::Error),
    WriteTmp(io::Error),
    Rename(io::Error),
}

impl std::fmt::Display for StoreSaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreSaveError::CreateDir(e) => write!(f, "create directory failed: {e}"),
            StoreSaveError::Serialize(e) => write!(f, "serialize failed: {e}"),
            StoreSaveError::WriteTmp(e) => write!(f, "tmp write failed: {e}"),
            StoreSaveError::Rename(e) => write!(f, "rename failed: {e}"),
        }
    }
}

impl std::error::Error for StoreSaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreSaveError::CreateDir(e) => Some(e),
            StoreSaveError::Serialize(e) => Some(e),
            StoreSaveError::WriteTmp(e) => Some(e),
            StoreSaveError::Rename(e) => Some(e),
        }
    }
}

/// Resolve the data directory: explicit override, then `LAUNCHPAD_DATA_DIR`,
/// then `%LOCALAPPDATA%/Launchpad`, then `./Launchpad`.
pub fn data_dir(explicit: Option<&Path>) -> PathBuf {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => std::env::var_os("LOCALAPPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Launchpad"),
        },
    };
    let _ = fs::create_dir_all(&dir);
    dir
}

pub fn load_json_from_path<T: DeserializeOwned>(path: &Path) -> Result<T, StoreLoadError> {
    let meta = fs::metadata(path).map_err(StoreLoadError::Metadata)?;
    if meta.len() > MAX_STORE_BYTES {
        return Err(StoreLoadError::TooLarge {
            size: meta.len(),
            max: MAX_STORE_BYTES,
        });
    }

    let data = fs::read_to_string(path).map_err(StoreLoadError::Read)?;
    serde_json::from_str(&data).map_err(StoreLoadError::Parse)
}

/// Load `path`, falling back to `T::default()` on any failure.
///
/// A missing file is the normal first-run case and is only logged at debug.
pub fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json_from_path(path) {
        Ok(value) => value,
        Err(err) if err.is_not_found() => {
            debug!(path = %path.display(), "no saved file yet");
            T::default()
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "ignoring unreadable file");
            T::default()
        }
    }
}

pub fn save_json_to_path<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreSaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(StoreSaveError::CreateDir)?;
    }
    let tmp = path.with_extension("json.tmp");
    let payload = serde_json::to_string_pretty(value).map_err(StoreSaveError::Serialize)?;
    fs::write(&tmp, payload.as_bytes()).map_err(StoreSaveError::WriteTmp)?;

    if path.exists() {
        let _ = fs::remove_file(path);
    }

    fs::rename(&tmp, path).map_err(StoreSaveError::Rename)?;
    Ok(())
}

pub fn save_json_with_retry<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreSaveError> {
    const MAX_ATTEMPTS: u32 = 3;
    const BACKOFF_BASE_MS: u64 = 50;

    let mut attempt = 1;
    loop {
        match save_json_to_path(path, value) {
            Ok(()) => return Ok(()),
            Err(err) if attempt >= MAX_ATTEMPTS => return Err(err),
            Err(err) => {
                debug!(path = %path.display(), attempt, %err, "save failed, retrying");
                let backoff_ms = BACKOFF_BASE_MS.saturating_mul(1_u64 << (attempt - 1));
                std::thread::sleep(Duration::from_millis(backoff_ms));
                attempt += 1;
            }
        }
    }
}
