use colored::Colorize;

use crate::adapters::store::json_store::AuditQuery;
use crate::cli::context;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::audit_entry::{AuditLogEntry, LogAction};

/// Execute the `invsync log` command.
///
/// Displays the change log with optional filters for server, action,
/// and entry count.
pub fn execute(server: Option<u64>, action: Option<&str>, last: Option<usize>) -> Result<()> {
    let action = action.map(str::parse::<LogAction>).transpose()?;
    let config = context::load_config()?;
    let store = context::open_store(&config)?;

    let entries = store.query_audit_log(AuditQuery {
        server_id: server,
        action,
        last,
    })?;

    if entries.is_empty() {
        output::header("invsync log");
        output::warning("No log entries found");
        if server.is_some() || action.is_some() {
            output::hint("Try removing filters to see all entries.");
        }
        return Ok(());
    }

    output::header(&format!("invsync log ({} entries)", entries.len()));
    println!();

    for entry in &entries {
        print_entry(entry);
    }

    Ok(())
}

/// Print a single log entry as a formatted row.
fn print_entry(entry: &AuditLogEntry) {
    let date = entry.created_at.format("%Y-%m-%d %H:%M:%S");
    println!(
        "  {} {} {:<8} {:>5} {}",
        date.to_string().dimmed(),
        "│".dimmed(),
        format_action(entry.action),
        format!("#{}", entry.server_id).dimmed(),
        entry.description,
    );
}

fn format_action(action: LogAction) -> String {
    match action {
        LogAction::Added => "added".green().to_string(),
        LogAction::Paused => "paused".yellow().to_string(),
        LogAction::Deleted => "deleted".red().to_string(),
        LogAction::Synced => "synced".blue().to_string(),
        LogAction::Updated => "updated".cyan().to_string(),
    }
}
