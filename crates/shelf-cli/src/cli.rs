use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Queue catalog products offline and sync them when the service is reachable")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Queue a new product and upload it when online
    #[command(alias = "new")]
    Add(AddArgs),
    /// Upload pending products and refresh the catalog
    Sync,
    /// Show queued writes
    Pending {
        /// Include writes that were already uploaded
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the merged catalog
    List(ListArgs),
    /// List product types present in the catalog
    Types,
    /// Pin a product locally
    Favorite {
        /// Exact product name
        name: String,
    },
    /// Unpin a product
    Unfavorite {
        /// Exact product name
        name: String,
    },
    /// Delete uploaded writes older than the retention window
    Prune {
        /// Retention window in days (defaults to SHELF_RETENTION_DAYS)
        #[arg(long, value_name = "DAYS")]
        days: Option<u64>,
    },
    /// Follow connectivity and upload queued products on reconnect
    Watch,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Product name
    pub name: String,
    /// Product type
    #[arg(long = "type", value_name = "TYPE")]
    pub product_type: String,
    /// Selling price
    #[arg(long)]
    pub price: f64,
    /// Tax rate in percent
    #[arg(long, default_value_t = 0.0)]
    pub tax: f64,
    /// JPEG image to upload with the product
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,
    /// Only queue the product; do not try to upload now
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Case-insensitive name filter
    #[arg(short, long)]
    pub search: Option<String>,
    /// Only show these product types (repeatable)
    #[arg(long = "type", value_name = "TYPE")]
    pub types: Vec<String>,
    /// Only show favorites (no network access)
    #[arg(long)]
    pub favorites: bool,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
