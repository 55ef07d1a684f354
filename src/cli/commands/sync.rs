use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::adapters::providers::build_registry;
use crate::cli::context;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::sync_report::{AccountOutcome, SyncReport};
use crate::core::services::sync_coordinator::SyncCoordinator;

/// Execute the `invsync sync` command.
///
/// Per-account failures are reported but do not fail the command.
pub fn execute(verbose: bool) -> Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config)?;
    let registry = build_registry(&config.providers);

    // Debug logs would tear through the spinner line.
    let spinner = (!verbose).then(|| spinner("Syncing accounts..."));
    let result =
        SyncCoordinator::new(&store, &registry, config.sync.on_write_failure).run();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    print_report(&result?);
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_report(report: &SyncReport) {
    output::header("invsync sync");

    if report.accounts.is_empty() && report.errors.is_empty() {
        output::warning("No accounts with credentials to sync");
        if report.accounts_skipped > 0 {
            output::hint(&format!(
                "{} account(s) skipped: no adapter for their provider.",
                report.accounts_skipped
            ));
        }
        return;
    }

    for outcome in &report.accounts {
        print_outcome(outcome);
    }

    for failure in &report.errors {
        output::error(&format!(
            "{} ({}): {}",
            failure.account_name,
            failure.provider.display_name(),
            failure.error
        ));
    }

    println!();
    println!(
        "  Synced {} server(s) across {} account(s)",
        report.servers_synced.to_string().bold(),
        report.accounts_processed
    );
    if report.accounts_skipped > 0 {
        println!(
            "  {} account(s) skipped: no adapter for their provider",
            report.accounts_skipped
        );
    }
    if report.has_errors() {
        output::warning(&format!("{} account(s) failed", report.errors.len()));
    }
}

fn print_outcome(outcome: &AccountOutcome) {
    let s = &outcome.stats;
    let mut parts = vec![
        format!("{} new", s.created),
        format!("{} updated", s.updated),
        format!("{} unchanged", s.unchanged),
        format!("{} deleted", s.deleted),
    ];
    if s.failed > 0 {
        parts.push(format!("{} failed", s.failed).red().to_string());
    }

    let line = format!(
        "{} ({}): {}",
        outcome.account_name,
        outcome.provider.display_name(),
        parts.join(", ")
    );
    if s.failed > 0 {
        output::warning(&line);
    } else {
        output::success(&line);
    }
}
