use std::path::Path;

use shelf_core::sync::SyncOptions;
use shelf_core::ShelfConfig;

use crate::commands::common::{build_engine, format_flush_summary};
use crate::error::CliError;

pub async fn run_sync(config: &ShelfConfig, db_path: &Path) -> Result<(), CliError> {
    let options = SyncOptions {
        refresh_after_upload: false,
        ..SyncOptions::from_config(config)
    };
    let engine = build_engine(config, db_path, options)?;
    engine.set_online(true);

    let report = engine.flush().await?;
    println!("{}", format_flush_summary(&report));
    for failed in &report.failed {
        println!("  {}  {}", failed.id, failed.error);
    }

    match engine.refresh_catalog().await {
        Ok(items) => println!("Catalog: {} products", items.len()),
        Err(error) => println!("Catalog refresh failed: {error}"),
    }
    Ok(())
}
