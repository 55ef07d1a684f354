use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::adapters::store::json_store::JsonInventoryStore;
use crate::config::app_config::AppConfig;
use crate::core::errors::{InventoryError, Result};

/// Default directory holding `config.toml` and the store file.
pub const DEFAULT_DIR: &str = ".invsync";

static INVSYNC_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the global invsync directory path.
/// If `custom` is provided, uses that path; otherwise defaults to `.invsync`.
pub fn init(custom: Option<&str>) {
    let dir = custom
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR));
    let _ = INVSYNC_DIR.set(dir);
}

/// Get the current invsync directory path.
pub fn invsync_dir() -> &'static Path {
    INVSYNC_DIR
        .get()
        .map(|p| p.as_path())
        .unwrap_or(Path::new(DEFAULT_DIR))
}

/// Load the config, failing with a hint when `init` has not been run.
pub fn load_config() -> Result<AppConfig> {
    let dir = invsync_dir();
    if !dir.exists() {
        return Err(InventoryError::InvalidConfig {
            detail: format!(
                "invsync not initialized ({} missing). Run 'invsync init' first.",
                dir.display()
            ),
        });
    }
    AppConfig::load(dir)
}

/// Open the store named in the config.
pub fn open_store(config: &AppConfig) -> Result<JsonInventoryStore> {
    JsonInventoryStore::open(&invsync_dir().join(&config.inventory.store_file))
}
