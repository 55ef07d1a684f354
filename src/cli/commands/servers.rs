use colored::Colorize;

use crate::adapters::store::json_store::{ServerEdit, ServerFilter};
use crate::cli::context;
use crate::cli::output;
use crate::cli::ServersAction;
use crate::core::errors::Result;
use crate::core::models::server_record::{ServerRecord, ServerStatus};

/// Execute the `invsync servers` command.
pub fn execute(account: Option<u64>, status: Option<&str>) -> Result<()> {
    let status = status.map(str::parse::<ServerStatus>).transpose()?;
    let config = context::load_config()?;
    let store = context::open_store(&config)?;

    let servers = store.list_servers(ServerFilter {
        account_id: account,
        status,
    })?;

    if servers.is_empty() {
        output::header("invsync servers");
        output::warning("No servers found");
        if account.is_some() || status.is_some() {
            output::hint("Try removing filters to see all servers.");
        }
        return Ok(());
    }

    output::header(&format!("invsync servers ({})", servers.len()));
    println!();
    for server in &servers {
        print_server(server);
    }

    let monthly: f64 = servers
        .iter()
        .filter(|s| s.status != ServerStatus::Deleted)
        .map(|s| s.approximate_cost)
        .sum();
    println!("\n  Approximate monthly cost (non-deleted): ${monthly:.2}");
    Ok(())
}

/// Execute `invsync servers set-status` or `invsync servers edit`.
pub fn execute_action(action: &ServersAction) -> Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config)?;

    match action {
        ServersAction::SetStatus { id, status } => {
            let status: ServerStatus = status.parse()?;
            let saved = store.set_server_status(*id, status)?;
            output::success(&format!(
                "Server {} ({}) is now {}",
                saved.id,
                saved.name,
                format_status(saved.status)
            ));
            if status == ServerStatus::Deleted {
                output::hint("The next sync reactivates it if the provider still lists it.");
            }
        }
        ServersAction::Edit {
            id,
            name,
            ip,
            location,
            description,
            responsible,
            cost,
            backups,
        } => {
            let edit = ServerEdit {
                name: name.clone(),
                ip: ip.clone(),
                location: location.clone(),
                description: description.clone(),
                responsible: responsible.clone(),
                approximate_cost: *cost,
                backups_enabled: *backups,
            };
            let saved = store.edit_server(*id, edit)?;
            output::success(&format!("Updated server {} ({})", saved.id, saved.name));
        }
    }
    Ok(())
}

fn print_server(server: &ServerRecord) {
    let ip = if server.ip.is_empty() {
        "—".dimmed().to_string()
    } else {
        server.ip.clone()
    };
    let responsible = if server.responsible.is_empty() {
        String::new()
    } else {
        format!("@{}", server.responsible).dimmed().to_string()
    };

    println!(
        "  {:>4} {} {:<8} {:<24} {:<40} {:<20} ${:>8.2} {}",
        server.id.to_string().dimmed(),
        "│".dimmed(),
        format_status(server.status),
        server.name,
        ip,
        server.location,
        server.approximate_cost,
        responsible,
    );
}

fn format_status(status: ServerStatus) -> String {
    match status {
        ServerStatus::Active => "active".green().to_string(),
        ServerStatus::Paused => "paused".yellow().to_string(),
        ServerStatus::Deleted => "deleted".red().to_string(),
    }
}
