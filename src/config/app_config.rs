use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::adapters::providers::{hetzner_cloud, hetzner_robot};
use crate::core::errors::{InventoryError, Result};
use crate::core::services::reconciler::WriteFailurePolicy;

/// Name of the config file inside the invsync directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Current format version supported by this build of invsync.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration read from `.invsync/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub inventory: InventorySection,
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub providers: ProvidersSection,
}

impl AppConfig {
    /// Load the configuration from `{dir}/config.toml`.
    ///
    /// After parsing, validates the store file name so a tampered config
    /// cannot point the store outside the invsync directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(InventoryError::InvalidConfig {
                detail: format!(
                    "{} not found. Run 'invsync init' first.",
                    config_path.display()
                ),
            });
        }
        let content = std::fs::read_to_string(&config_path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| InventoryError::InvalidConfig {
            detail: format!("Failed to parse config.toml: {e}"),
        })?;

        if config.inventory.format_version > CURRENT_FORMAT_VERSION {
            return Err(InventoryError::FormatVersionTooNew {
                project_version: config.inventory.format_version,
                supported_version: CURRENT_FORMAT_VERSION,
            });
        }

        validate_simple_filename(&config.inventory.store_file, "store file")?;
        for (name, settings) in [
            ("hetzner_cloud", &config.providers.hetzner_cloud),
            ("hetzner_robot", &config.providers.hetzner_robot),
        ] {
            if settings.timeout_secs == 0 {
                return Err(InventoryError::InvalidConfig {
                    detail: format!("providers.{name}.timeout_secs must be greater than 0"),
                });
            }
        }

        Ok(config)
    }

    /// The default config written by `invsync init`.
    pub fn default_toml() -> String {
        format!(
            r#"[inventory]
version = "{version}"
format_version = {CURRENT_FORMAT_VERSION}
store_file = "{store}"

[sync]
# "retain" keeps a server whose update failed; "sweep" marks it deleted.
on_write_failure = "retain"

[providers.hetzner_cloud]
base_url = "{cloud}"
timeout_secs = {DEFAULT_TIMEOUT_SECS}

[providers.hetzner_robot]
base_url = "{robot}"
timeout_secs = {DEFAULT_TIMEOUT_SECS}
"#,
            version = env!("CARGO_PKG_VERSION"),
            store = default_store_file(),
            cloud = hetzner_cloud::DEFAULT_BASE_URL,
            robot = hetzner_robot::DEFAULT_BASE_URL,
        )
    }
}

/// The `[inventory]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct InventorySection {
    pub version: String,
    /// Format version for backward compatibility. Defaults to 1 if missing.
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    /// File name of the JSON store, relative to the invsync directory.
    #[serde(default = "default_store_file")]
    pub store_file: String,
}

fn default_format_version() -> u32 {
    1
}

fn default_store_file() -> String {
    "inventory.json".into()
}

/// The `[sync]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncSection {
    #[serde(default)]
    pub on_write_failure: WriteFailurePolicy,
}

/// The `[providers]` table; one entry per built-in adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProvidersSection {
    #[serde(default = "ProviderSettings::hetzner_cloud")]
    pub hetzner_cloud: ProviderSettings,
    #[serde(default = "ProviderSettings::hetzner_robot")]
    pub hetzner_robot: ProviderSettings,
}

impl Default for ProvidersSection {
    fn default() -> Self {
        Self {
            hetzner_cloud: ProviderSettings::hetzner_cloud(),
            hetzner_robot: ProviderSettings::hetzner_robot(),
        }
    }
}

/// Connection settings for one provider API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderSettings {
    fn hetzner_cloud() -> Self {
        Self {
            base_url: hetzner_cloud::DEFAULT_BASE_URL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    fn hetzner_robot() -> Self {
        Self {
            base_url: hetzner_robot::DEFAULT_BASE_URL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Reject anything that is not a bare file name (separators, `..`, empty).
pub fn validate_simple_filename(name: &str, what: &str) -> Result<()> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains("..")
        || Path::new(name).is_absolute();

    if invalid {
        return Err(InventoryError::InvalidConfig {
            detail: format!("{what} '{name}' must be a plain file name inside the invsync directory"),
        });
    }
    Ok(())
}
