use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use shelf_core::sync::SyncOptions;
use shelf_core::{
    CatalogStore, CatalogView, FavoriteOverride, FlushReport, HttpCatalogClient, ItemSource,
    ListedProduct, PendingWrite, ShelfConfig, SyncEngine, SyncEvent,
};

use crate::error::CliError;

pub const ENV_DB_PATH: &str = "SHELF_DB_PATH";

#[derive(Debug, Serialize)]
pub struct ProductListItem {
    pub name: String,
    pub product_type: String,
    pub price: f64,
    pub tax: f64,
    pub image: Option<String>,
    pub source: ItemSource,
}

#[derive(Debug, Serialize)]
pub struct PendingWriteItem {
    pub id: String,
    pub name: String,
    pub product_type: String,
    pub price: f64,
    pub tax: f64,
    pub has_image: bool,
    pub status: String,
    pub created_at: i64,
    pub created_at_iso: String,
    pub attempts: u32,
    pub last_error: Option<String>,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match cli_db_path.or_else(|| env::var_os(ENV_DB_PATH).map(PathBuf::from)) {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("shelf").join("shelf.db"))
        .ok_or(CliError::DataDirUnavailable)
}

pub fn open_store(path: &Path) -> Result<CatalogStore, CliError> {
    Ok(CatalogStore::open_path(path)?)
}

pub fn build_engine(
    config: &ShelfConfig,
    db_path: &Path,
    options: SyncOptions,
) -> Result<SyncEngine<HttpCatalogClient>, CliError> {
    let store = open_store(db_path)?;
    let remote = HttpCatalogClient::new(config)?;
    Ok(SyncEngine::new(store, remote, options))
}

/// Refresh the catalog and merge it with local state. An unreachable service
/// degrades to favorites and queued writes only.
pub async fn load_catalog_view(
    engine: &SyncEngine<HttpCatalogClient>,
) -> Result<CatalogView, CliError> {
    if let Err(error) = engine.refresh_catalog().await {
        eprintln!("Catalog unavailable ({error}); showing local products only");
    }
    Ok(engine.catalog_view().await?)
}

pub fn parse_type_selection(types: &[String]) -> BTreeSet<String> {
    types
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub fn favorites_as_listed(favorites: Vec<FavoriteOverride>) -> Vec<ListedProduct> {
    favorites
        .into_iter()
        .map(|favorite| ListedProduct {
            item: favorite.item,
            source: ItemSource::Favorite,
        })
        .collect()
}

pub fn product_to_list_item(product: &ListedProduct) -> ProductListItem {
    ProductListItem {
        name: product.item.name.clone(),
        product_type: product.item.category.clone(),
        price: product.item.price,
        tax: product.item.tax_rate,
        image: product.item.image_ref.clone(),
        source: product.source,
    }
}

pub fn format_product_lines(products: &[ListedProduct]) -> Vec<String> {
    products
        .iter()
        .map(|product| {
            let marker = match product.source {
                ItemSource::Favorite => "*",
                ItemSource::Remote => " ",
                ItemSource::LocalPending => "~",
            };
            format!(
                "{marker} {:<32}  {:<16}  {:>10}  tax {}%",
                truncate(&product.item.name, 32),
                truncate(&product.item.category, 16),
                format_price(product.item.price),
                product.item.tax_rate
            )
        })
        .collect()
}

pub fn write_to_item(write: &PendingWrite) -> PendingWriteItem {
    PendingWriteItem {
        id: write.id.to_string(),
        name: write.payload.name.clone(),
        product_type: write.payload.category.clone(),
        price: write.payload.price,
        tax: write.payload.tax_rate,
        has_image: write.payload.image.is_some(),
        status: write.status.to_string(),
        created_at: write.created_at,
        created_at_iso: format_timestamp(write.created_at),
        attempts: write.attempt_count,
        last_error: write.last_error.clone(),
    }
}

pub fn format_pending_lines(writes: &[PendingWrite], now_ms: i64) -> Vec<String> {
    writes
        .iter()
        .map(|write| {
            let id = write.id.to_string();
            let short_id = id.chars().take(13).collect::<String>();
            let queued = format_relative_time(write.created_at, now_ms);
            let line = format!(
                "{short_id:<13}  {:<8}  {:<32}  {queued:<10}",
                write.status,
                truncate(&write.payload.name, 32)
            );
            match &write.last_error {
                Some(error) if write.is_pending() => {
                    format!("{line}  attempts={} last_error={error}", write.attempt_count)
                }
                _ => line,
            }
        })
        .collect()
}

pub fn format_flush_summary(report: &FlushReport) -> String {
    let mut summary = format!(
        "Uploaded {}, failed {}, skipped {}",
        report.uploaded.len(),
        report.failed.len(),
        report.skipped.len()
    );
    if report.pruned > 0 {
        summary.push_str(&format!(", pruned {}", report.pruned));
    }
    summary
}

/// One-line rendering of the events worth showing while watching.
pub fn describe_event(event: &SyncEvent) -> Option<String> {
    match event {
        SyncEvent::ConnectivityChanged { online: true } => Some("Online".to_string()),
        SyncEvent::ConnectivityChanged { online: false } => {
            Some("Offline; new products will be queued".to_string())
        }
        SyncEvent::WriteUploaded(id) => Some(format!("Uploaded {id}")),
        SyncEvent::WriteFailed { id, error } => Some(format!("Upload of {id} failed: {error}")),
        SyncEvent::FlushFinished(report) if report.attempted() > 0 => {
            Some(format_flush_summary(report))
        }
        SyncEvent::CatalogRefreshed { items } => {
            Some(format!("Catalog refreshed: {items} products"))
        }
        SyncEvent::CatalogRefreshFailed(error) => Some(format!("Catalog refresh failed: {error}")),
        SyncEvent::FlushStarted
        | SyncEvent::WriteSkipped(_)
        | SyncEvent::FlushFinished(_) => None,
    }
}

pub fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else {
        format!("{}d ago", diff / day)
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut truncated = text
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}
