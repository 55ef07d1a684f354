pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};

/// Keep your server inventory in sync with your cloud providers.
#[derive(Parser, Debug)]
#[command(name = "invsync", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding config.toml and the inventory (default: .invsync)
    #[arg(long, global = true, env = "INVSYNC_DIR")]
    pub dir: Option<String>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the invsync directory, default config and an empty inventory
    Init,

    /// Manage provider accounts
    Accounts {
        #[command(subcommand)]
        action: AccountsAction,
    },

    /// Sync every account with credentials against its provider
    Sync,

    /// List servers in the inventory, or change one by hand
    #[command(args_conflicts_with_subcommands = true)]
    Servers {
        #[command(subcommand)]
        action: Option<ServersAction>,
        /// Only servers of this account id
        #[arg(long)]
        account: Option<u64>,
        /// Only servers with this status (active, paused, deleted)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show the inventory change log
    Log {
        /// Only entries for this server id
        #[arg(long)]
        server: Option<u64>,
        /// Only entries with this action (added, paused, deleted, synced, updated)
        #[arg(long)]
        action: Option<String>,
        /// Show last N entries
        #[arg(long)]
        last: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountsAction {
    /// Add a provider account
    Add {
        /// Provider kind (hetzner_cloud, hetzner_robot, aws, scaleway, vsys_host)
        #[arg(long)]
        provider: String,
        /// Display name, unique per provider
        #[arg(long)]
        name: String,
        /// API token, or 'username:password' for Hetzner Robot
        #[arg(long, env = "INVSYNC_API_KEY", hide_env_values = true)]
        api_key: String,
        /// Login for providers with basic auth
        #[arg(long)]
        login: Option<String>,
    },
    /// List configured accounts (API keys masked)
    List,
}

#[derive(Subcommand, Debug)]
pub enum ServersAction {
    /// Set a server's status (active, paused, deleted)
    SetStatus {
        /// Server id
        id: u64,
        /// New status
        status: String,
    },
    /// Edit a server's fields. Sync later overwrites everything but --responsible.
    Edit {
        /// Server id
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        ip: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Person or team looking after the server
        #[arg(long)]
        responsible: Option<String>,
        /// Approximate monthly cost
        #[arg(long)]
        cost: Option<f64>,
        /// Whether backups are enabled (true/false)
        #[arg(long)]
        backups: Option<bool>,
    },
}
