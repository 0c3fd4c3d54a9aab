use std::path::Path;
use std::time::Duration;

use shelf_core::ShelfConfig;

use crate::commands::common::open_store;
use crate::error::CliError;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

pub async fn run_prune(
    days: Option<u64>,
    config: &ShelfConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let Some(window) = retention_window(days, config) else {
        println!("Retention is disabled; pass --days to prune anyway.");
        return Ok(());
    };

    let removed = open_store(db_path)?.prune_uploaded(window).await?;
    println!("Pruned {removed} uploaded writes");
    Ok(())
}

pub fn retention_window(days: Option<u64>, config: &ShelfConfig) -> Option<Duration> {
    days.map(|days| Duration::from_secs(days.saturating_mul(SECS_PER_DAY)))
        .or_else(|| config.retention())
}
