pub mod hetzner_cloud;
pub mod hetzner_robot;

use std::time::Duration;

use crate::config::app_config::ProvidersSection;
use crate::core::errors::{InventoryError, Result};
use crate::core::services::sync_coordinator::ProviderRegistry;

use self::hetzner_cloud::HetznerCloudProvider;
use self::hetzner_robot::HetznerRobotProvider;

/// Register an adapter for every provider kind this build can talk to.
pub fn build_registry(section: &ProvidersSection) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(HetznerCloudProvider::from_settings(
        &section.hetzner_cloud,
    )));
    registry.register(Box::new(HetznerRobotProvider::from_settings(
        &section.hetzner_robot,
    )));
    registry
}

/// One current-thread runtime per call; adapters are driven from sync code.
fn runtime(provider: &str) -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| InventoryError::Transport {
            provider: provider.to_string(),
            detail: format!("Failed to create async runtime: {e}"),
        })
}

fn build_client(provider: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(format!("invsync/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| InventoryError::Transport {
            provider: provider.to_string(),
            detail: format!("Failed to create HTTP client: {e}"),
        })
}

fn transport_error(provider: &str, err: reqwest::Error) -> InventoryError {
    let detail = if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    };
    InventoryError::Transport {
        provider: provider.to_string(),
        detail,
    }
}

fn decode_error(provider: &str, err: serde_json::Error) -> InventoryError {
    InventoryError::Decode {
        provider: provider.to_string(),
        detail: err.to_string(),
    }
}
