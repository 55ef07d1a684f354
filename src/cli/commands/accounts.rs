use colored::Colorize;

use crate::cli::AccountsAction;
use crate::cli::context;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::account::{Account, NewAccount, ProviderKind};

/// Execute the `invsync accounts` command.
pub fn execute(action: &AccountsAction) -> Result<()> {
    match action {
        AccountsAction::Add {
            provider,
            name,
            api_key,
            login,
        } => execute_add(provider, name, api_key, login.as_deref()),
        AccountsAction::List => execute_list(),
    }
}

fn execute_add(provider: &str, name: &str, api_key: &str, login: Option<&str>) -> Result<()> {
    let provider: ProviderKind = provider.parse()?;
    let config = context::load_config()?;
    let store = context::open_store(&config)?;

    let account = store.add_account(NewAccount {
        provider,
        name: name.to_string(),
        login: login.map(str::to_string),
        api_key: api_key.to_string(),
    })?;

    output::success(&format!(
        "Added {} account '{}' (id {})",
        provider.display_name(),
        account.name,
        account.id
    ));
    if !account.has_credentials() {
        output::warning("No API key set; this account will be skipped by sync");
    }
    Ok(())
}

fn execute_list() -> Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config)?;
    let accounts = store.list_accounts()?;

    if accounts.is_empty() {
        output::header("invsync accounts");
        output::warning("No accounts configured");
        output::hint("Run 'invsync accounts add' to add one.");
        return Ok(());
    }

    output::header(&format!("invsync accounts ({})", accounts.len()));
    println!();
    for account in &accounts {
        print_account(account);
    }
    Ok(())
}

fn print_account(account: &Account) {
    let login = account
        .login
        .as_deref()
        .map(|l| format!(" login={l}"))
        .unwrap_or_default();
    println!(
        "  {:>4} {} {:<14} {}{} {}",
        account.id.to_string().dimmed(),
        "│".dimmed(),
        account.provider.ident().cyan(),
        account.name,
        login.dimmed(),
        mask_key(&account.api_key).dimmed(),
    );
}

/// Show only the last four characters of a key.
fn mask_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return "(no key)".into();
    }
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".into();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
