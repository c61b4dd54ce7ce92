//! Where the CLI keeps its preference file.

use std::path::PathBuf;

use colorscheme::{FileStore, MemoryStore, PreferenceStore};

/// Environment variable naming the preference file.
pub const STORE_ENV: &str = "COLORSCHEME_STORE";

const APP_DIR: &str = "colorscheme";
const STORE_FILE: &str = "preferences.json";

/// How the preference should be persisted for this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    /// Keep the preference for this process only.
    Ephemeral,
}

impl StoreLocation {
    /// Resolves the location from the `--store` / `--no-store` flags,
    /// falling back to the platform config directory.
    ///
    /// `explicit` already includes `COLORSCHEME_STORE`, which clap reads.
    pub fn resolve(explicit: Option<PathBuf>, ephemeral: bool) -> Self {
        if ephemeral {
            return StoreLocation::Ephemeral;
        }
        if let Some(path) = explicit {
            return StoreLocation::File(path);
        }
        match default_store_path() {
            Some(path) => StoreLocation::File(path),
            None => {
                tracing::warn!("no config directory on this platform, preference will not be saved");
                StoreLocation::Ephemeral
            }
        }
    }

    pub fn open(&self) -> Box<dyn PreferenceStore> {
        match self {
            StoreLocation::File(path) => Box::new(FileStore::new(path)),
            StoreLocation::Ephemeral => Box::new(MemoryStore::new()),
        }
    }
}

/// `<config dir>/colorscheme/preferences.json`, e.g.
/// `~/.config/colorscheme/preferences.json` on Linux.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(STORE_FILE))
}
