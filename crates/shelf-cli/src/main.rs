//! Shelf CLI - queue catalog products from the terminal
//!
//! Products are stored locally first and uploaded whenever the catalog
//! service is reachable.

mod cli;
mod commands;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;
use shelf_core::ShelfConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::resolve_db_path;
use crate::commands::favorite::{run_favorite, run_unfavorite};
use crate::commands::list::{run_list, run_types};
use crate::commands::pending::run_pending;
use crate::commands::prune::run_prune;
use crate::commands::sync::run_sync;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path)?;
    let config = ShelfConfig::from_env()?;

    match cli.command {
        Commands::Add(args) => run_add(&args, &config, &db_path).await,
        Commands::Sync => run_sync(&config, &db_path).await,
        Commands::Pending { all, json } => run_pending(all, json, &db_path).await,
        Commands::List(args) => run_list(&args, &config, &db_path).await,
        Commands::Types => run_types(&config, &db_path).await,
        Commands::Favorite { name } => run_favorite(&name, &config, &db_path).await,
        Commands::Unfavorite { name } => run_unfavorite(&name, &db_path).await,
        Commands::Prune { days } => run_prune(days, &config, &db_path).await,
        Commands::Watch => run_watch(&config, &db_path).await,
    }
}

fn init_tracing() -> Result<(), CliError> {
    let directive = "shelf=info"
        .parse()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
