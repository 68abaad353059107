use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wls_cli::commands::{clear, import};
use wls_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    config.apply_overrides(cli.base_url, cli.account_id, cli.api_token);
    tracing::debug!(?config, "loaded configuration");

    match &cli.command {
        Some(Commands::Import { file }) => {
            import::run(&config, file.as_deref())?;
        }
        Some(Commands::Clear { dates }) => {
            clear::run(&config, dates)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
