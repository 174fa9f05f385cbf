//! Domain logic for the Launchpad saved-server launcher: the profile store,
//! the view tree it renders into, and the controllers that keep the two in
//! step. Nothing here performs I/O; persistence sits behind [`backend::Backend`].

pub mod backend;
pub mod clients;
pub mod debounce;
pub mod drag;
pub mod i18n;
pub mod profile;
pub mod rows;
pub mod store;
pub mod tabs;
pub mod view;

pub use backend::{Backend, BackendError};
pub use clients::InstalledClient;
pub use i18n::{Catalog, DEFAULT_LANGUAGE, LanguageId, TranslateError, Translator};
pub use profile::{ProfileField, ProfileId, ServerProfile};
pub use store::{ProfileStore, StoreError};
pub use view::{EventKind, NodeId, ViewError, ViewTree};
