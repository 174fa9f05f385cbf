pub mod dispatch;
pub mod file_backend;
pub mod launcher;
pub mod logging;
pub mod shell;
pub mod storage;
pub mod worker;

/// Translations compiled into the binary.
pub const BUNDLED_CATALOG: &str = include_str!("../assets/i18n.json");
