use std::path::Path;

use shelf_core::sync::SyncOptions;
use shelf_core::{CatalogStore, CatalogView, FavoriteOverride, ShelfConfig};

use crate::commands::common::{build_engine, load_catalog_view, open_store};
use crate::error::CliError;

pub async fn run_favorite(
    name: &str,
    config: &ShelfConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let name = name.trim();
    let engine = build_engine(config, db_path, SyncOptions::from_config(config))?;
    let view = load_catalog_view(&engine).await?;
    let favorite = pin_from_view(engine.store(), &view, name).await?;
    println!("Pinned '{}'", favorite.name());
    Ok(())
}

pub async fn run_unfavorite(name: &str, db_path: &Path) -> Result<(), CliError> {
    let name = name.trim();
    if open_store(db_path)?.remove_favorite(name).await? {
        println!("Unpinned '{name}'");
    } else {
        println!("'{name}' was not a favorite");
    }
    Ok(())
}

/// Pin the entry named `name`, snapshotting what the view currently shows.
pub async fn pin_from_view(
    store: &CatalogStore,
    view: &CatalogView,
    name: &str,
) -> Result<FavoriteOverride, CliError> {
    let entry = view
        .entries()
        .iter()
        .find(|entry| entry.item.name == name)
        .ok_or_else(|| CliError::ProductNotFound(name.to_string()))?;
    Ok(store.upsert_favorite(&entry.item).await?)
}
