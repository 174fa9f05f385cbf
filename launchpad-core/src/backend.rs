//! The persistence and command boundary the launcher writes through.

use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

use crate::clients::InstalledClient;
use crate::i18n::LanguageId;
use crate::profile::{ProfileField, ServerProfile};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("profile index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("unknown language `{0}`")]
    UnknownLanguage(LanguageId),
    #[error("failed to save {what}: {reason}")]
    Storage { what: &'static str, reason: String },
    #[error("{path} is not a usable client executable: {reason}")]
    InvalidClient { path: PathBuf, reason: String },
    #[error("{0} is already registered")]
    DuplicateClient(PathBuf),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for profiles, settings and the client registry.
///
/// Profiles are addressed by position; callers issue commands one at a time
/// in the order their view changed, so an index always means what it meant
/// when the command was sent. `reorder_profiles(i, i)` must succeed as a
/// no-op.
pub trait Backend: Send + Sync + 'static {
    fn load_profiles(
        &self,
    ) -> impl Future<Output = Result<Vec<ServerProfile>, BackendError>> + Send;

    fn add_profile(
        &self,
        profile: ServerProfile,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn remove_profile(&self, index: usize) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn reorder_profiles(
        &self,
        old_index: usize,
        new_index: usize,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn set_profile_field(
        &self,
        index: usize,
        field: ProfileField,
        value: String,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn current_language(&self) -> impl Future<Output = LanguageId> + Send;

    fn set_language(
        &self,
        language: LanguageId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn list_installed_clients(
        &self,
    ) -> impl Future<Output = Result<Vec<InstalledClient>, BackendError>> + Send;

    fn add_client(
        &self,
        executable: PathBuf,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;
}
