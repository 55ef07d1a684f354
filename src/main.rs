use clap::Parser;
use tracing_subscriber::EnvFilter;

use invsync::cli::{self, Cli, Commands};

fn main() {
    let args = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli::context::init(args.dir.as_deref());

    let result = match &args.command {
        Commands::Init => cli::commands::init::execute(args.verbose),
        Commands::Accounts { action } => cli::commands::accounts::execute(action),
        Commands::Sync => cli::commands::sync::execute(args.verbose),
        Commands::Servers {
            action: Some(action),
            ..
        } => cli::commands::servers::execute_action(action),
        Commands::Servers {
            action: None,
            account,
            status,
        } => cli::commands::servers::execute(*account, status.as_deref()),
        Commands::Log {
            server,
            action,
            last,
        } => cli::commands::log::execute(*server, action.as_deref(), *last),
    };

    if let Err(e) = result {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
