use crate::adapters::store::json_store::JsonInventoryStore;
use crate::cli::context;
use crate::cli::output;
use crate::config::app_config::{AppConfig, CONFIG_FILE};
use crate::core::errors::{InventoryError, Result};

/// Execute the `invsync init` command.
///
/// Creates the invsync directory with a default `config.toml` and an
/// empty inventory file.
pub fn execute(verbose: bool) -> Result<()> {
    let dir = context::invsync_dir();
    let config_path = dir.join(CONFIG_FILE);

    if config_path.exists() {
        return Err(InventoryError::InvalidConfig {
            detail: format!(
                "invsync is already initialized here ({} exists)",
                config_path.display()
            ),
        });
    }

    output::header("invsync — Initializing inventory");

    std::fs::create_dir_all(dir)?;
    output::success(&format!("Created {}/", dir.display()));

    std::fs::write(&config_path, AppConfig::default_toml())?;
    output::success(&format!("Generated {CONFIG_FILE} with defaults"));

    let config = AppConfig::load(dir)?;
    let store_path = dir.join(&config.inventory.store_file);
    JsonInventoryStore::create(&store_path)?;
    output::success(&format!("Created empty inventory {}", store_path.display()));

    println!();
    println!("  Next steps:");
    println!("     1. Add an account: invsync accounts add --provider hetzner_cloud --name main --api-key <token>");
    println!("     2. Run 'invsync sync'");

    if verbose {
        println!();
        println!("  Files created:");
        println!("     {}   — configuration", config_path.display());
        println!("     {}   — accounts, servers and change log", store_path.display());
    }

    Ok(())
}
