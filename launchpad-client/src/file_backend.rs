//! JSON-file implementation of [`Backend`].
//!
//! Each mutation is applied to the in-memory copy first and then the whole
//! file is rewritten. A failed write leaves the in-memory copy mutated, the
//! same way the view keeps its optimistic state, so later index-based
//! commands still line up with what the user sees.

use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use launchpad_core::{
    Backend, BackendError, InstalledClient, LanguageId, ProfileField, ServerProfile,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::storage::{
    CLIENTS_FILE, MAX_STORE_BYTES, SAVED_SERVERS_FILE, SETTINGS_FILE, Settings,
    load_json_or_default, save_json_with_retry,
};

/// Hex digits of the executable digest used as its version label.
pub const VERSION_LABEL_LEN: usize = 12;

/// Executables larger than this are not fingerprinted.
const MAX_CLIENT_BYTES: u64 = 512 * MAX_STORE_BYTES;

#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
    known_languages: Vec<LanguageId>,
    profiles: Mutex<VecDeque<ServerProfile>>,
    settings: Mutex<Settings>,
    clients: Mutex<Vec<InstalledClient>>,
}

impl FileBackend {
    /// Open the store rooted at `dir`. Unreadable files start out empty.
    pub fn open(dir: &Path, known_languages: Vec<LanguageId>) -> Self {
        let profiles: VecDeque<ServerProfile> =
            load_json_or_default(&dir.join(SAVED_SERVERS_FILE));
        let mut settings: Settings = load_json_or_default(&dir.join(SETTINGS_FILE));
        let clients: Vec<InstalledClient> = load_json_or_default(&dir.join(CLIENTS_FILE));

        if !known_languages.contains(&settings.language) {
            warn!(language = %settings.language, "saved language is not bundled, using default");
            settings = Settings::default();
        }
        info!(
            dir = %dir.display(),
            profiles = profiles.len(),
            clients = clients.len(),
            language = %settings.language,
            "opened data directory"
        );

        Self {
            dir: dir.to_path_buf(),
            known_languages,
            profiles: Mutex::new(profiles),
            settings: Mutex::new(settings),
            clients: Mutex::new(clients),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn mutate_profiles<R>(
        &self,
        apply: impl FnOnce(&mut VecDeque<ServerProfile>) -> Result<R, BackendError>,
    ) -> Result<R, BackendError> {
        let mut profiles = lock(&self.profiles)?;
        let out = apply(&mut profiles)?;
        save(&self.dir.join(SAVED_SERVERS_FILE), &*profiles, "saved servers")?;
        Ok(out)
    }
}

impl Backend for FileBackend {
    async fn load_profiles(&self) -> Result<Vec<ServerProfile>, BackendError> {
        Ok(lock(&self.profiles)?.iter().cloned().collect())
    }

    async fn add_profile(&self, profile: ServerProfile) -> Result<(), BackendError> {
        self.mutate_profiles(|profiles| {
            profiles.push_front(profile);
            Ok(())
        })
    }

    async fn remove_profile(&self, index: usize) -> Result<(), BackendError> {
        self.mutate_profiles(|profiles| {
            check_index(profiles, index)?;
            profiles.remove(index);
            Ok(())
        })
    }

    async fn reorder_profiles(&self, old_index: usize, new_index: usize) -> Result<(), BackendError> {
        self.mutate_profiles(|profiles| {
            check_index(profiles, old_index)?;
            check_index(profiles, new_index)?;
            if let Some(profile) = profiles.remove(old_index) {
                profiles.insert(new_index, profile);
            }
            Ok(())
        })
    }

    async fn set_profile_field(
        &self,
        index: usize,
        field: ProfileField,
        value: String,
    ) -> Result<(), BackendError> {
        self.mutate_profiles(|profiles| {
            let len = profiles.len();
            let profile = profiles
                .get_mut(index)
                .ok_or(BackendError::IndexOutOfRange { index, len })?;
            profile.set_field(field, value);
            Ok(())
        })
    }

    async fn current_language(&self) -> LanguageId {
        match lock(&self.settings) {
            Ok(settings) => settings.language.clone(),
            Err(err) => {
                warn!(%err, "settings unavailable, reporting default language");
                Settings::default().language
            }
        }
    }

    async fn set_language(&self, language: LanguageId) -> Result<(), BackendError> {
        if !self.known_languages.contains(&language) {
            return Err(BackendError::UnknownLanguage(language));
        }
        let mut settings = lock(&self.settings)?;
        settings.language = language;
        save(&self.dir.join(SETTINGS_FILE), &*settings, "settings")
    }

    async fn list_installed_clients(&self) -> Result<Vec<InstalledClient>, BackendError> {
        Ok(lock(&self.clients)?.clone())
    }

    async fn add_client(&self, executable: PathBuf) -> Result<String, BackendError> {
        let mut clients = lock(&self.clients)?;
        if clients.iter().any(|client| client.path == executable) {
            return Err(BackendError::DuplicateClient(executable));
        }
        let version = fingerprint(&executable)?;
        debug!(path = %executable.display(), %version, "fingerprinted client");

        clients.push(InstalledClient {
            version: version.clone(),
            path: executable,
        });
        save(&self.dir.join(CLIENTS_FILE), &*clients, "client registry")?;
        Ok(version)
    }
}

/// Version label for an executable: the leading hex digits of its SHA-256.
pub fn fingerprint(path: &Path) -> Result<String, BackendError> {
    let invalid = |reason: String| BackendError::InvalidClient {
        path: path.to_path_buf(),
        reason,
    };
    let meta = fs::metadata(path).map_err(|e| invalid(e.to_string()))?;
    if !meta.is_file() {
        return Err(invalid("not a regular file".to_owned()));
    }
    if meta.len() > MAX_CLIENT_BYTES {
        return Err(invalid(format!("file too large: {} bytes", meta.len())));
    }
    let bytes = fs::read(path).map_err(|e| invalid(e.to_string()))?;
    let mut label = hex::encode(Sha256::digest(&bytes));
    label.truncate(VERSION_LABEL_LEN);
    Ok(label)
}

fn check_index(profiles: &VecDeque<ServerProfile>, index: usize) -> Result<(), BackendError> {
    if index < profiles.len() {
        Ok(())
    } else {
        Err(BackendError::IndexOutOfRange {
            index,
            len: profiles.len(),
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, BackendError> {
    mutex
        .lock()
        .map_err(|_| BackendError::Unavailable("storage lock poisoned".to_owned()))
}

fn save<T: serde::Serialize + ?Sized>(
    path: &Path,
    value: &T,
    what: &'static str,
) -> Result<(), BackendError> {
    save_json_with_retry(path, value).map_err(|err| {
        warn!(path = %path.display(), %err, "save failed");
        BackendError::Storage {
            what,
            reason: err.to_string(),
        }
    })
}
