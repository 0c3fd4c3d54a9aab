use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use shelf_core::sync::{FailedWrite, FlushReport};
use shelf_core::{
    CatalogItem, CatalogStore, CatalogView, FavoriteOverride, ItemSource, PendingWrite,
    PendingWriteId, ProductPayload, ShelfConfig, SubmitError, SyncEvent,
};

use crate::cli::ListArgs;
use crate::commands::add::read_image;
use crate::commands::common::{
    describe_event, format_flush_summary, format_pending_lines, format_price,
    format_product_lines, format_relative_time, format_timestamp, parse_type_selection,
    resolve_db_path, write_to_item,
};
use crate::commands::favorite::{pin_from_view, run_unfavorite};
use crate::commands::list::run_list;
use crate::commands::pending::run_pending;
use crate::commands::prune::{retention_window, run_prune};
use crate::error::CliError;

#[test]
fn resolve_db_path_prefers_explicit_path() {
    let explicit = PathBuf::from("/tmp/shelf-explicit.db");
    assert_eq!(resolve_db_path(Some(explicit.clone())).unwrap(), explicit);
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
}

#[test]
fn format_timestamp_returns_utc_label() {
    assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn format_price_uses_two_decimals() {
    assert_eq!(format_price(5.0), "5.00");
    assert_eq!(format_price(12.5), "12.50");
}

#[test]
fn parse_type_selection_trims_and_drops_blanks() {
    let selected = parse_type_selection(&[
        " Office ".to_string(),
        String::new(),
        "Kitchen".to_string(),
        "Office".to_string(),
    ]);
    let expected: BTreeSet<String> = ["Kitchen", "Office"]
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(selected, expected);
}

#[test]
fn retention_window_prefers_explicit_days() {
    let config = ShelfConfig::default();
    assert_eq!(
        retention_window(Some(1), &config),
        Some(Duration::from_secs(86_400))
    );
    assert_eq!(retention_window(None, &config), config.retention());

    let disabled = ShelfConfig {
        retention_days: None,
        ..ShelfConfig::default()
    };
    assert_eq!(retention_window(None, &disabled), None);
}

#[test]
fn format_flush_summary_mentions_pruned_rows_only_when_present() {
    let mut report = FlushReport {
        uploaded: vec![PendingWriteId::new(), PendingWriteId::new()],
        failed: vec![FailedWrite {
            id: PendingWriteId::new(),
            error: SubmitError::Transport("timed out".to_string()),
        }],
        ..FlushReport::default()
    };
    assert_eq!(format_flush_summary(&report), "Uploaded 2, failed 1, skipped 0");

    report.pruned = 4;
    assert_eq!(
        format_flush_summary(&report),
        "Uploaded 2, failed 1, skipped 0, pruned 4"
    );
}

#[test]
fn describe_event_hides_noise() {
    assert_eq!(describe_event(&SyncEvent::FlushStarted), None);
    assert_eq!(
        describe_event(&SyncEvent::FlushFinished(FlushReport::default())),
        None
    );
    assert_eq!(
        describe_event(&SyncEvent::ConnectivityChanged { online: true }).as_deref(),
        Some("Online")
    );

    let failed = describe_event(&SyncEvent::WriteFailed {
        id: PendingWriteId::new(),
        error: SubmitError::Server {
            status: 503,
            body: "maintenance".to_string(),
        },
    })
    .unwrap();
    assert!(failed.contains("HTTP 503"));
}

#[test]
fn pending_lines_show_failure_details() {
    let mut write = PendingWrite::new(ProductPayload::new("Notebook", "Books", 5.0, 5.0).unwrap());
    write.attempt_count = 2;
    write.last_error = Some("HTTP 500".to_string());

    let lines = format_pending_lines(&[write.clone()], write.created_at + 120_000);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("pending"));
    assert!(lines[0].contains("Notebook"));
    assert!(lines[0].contains("2m ago"));
    assert!(lines[0].contains("attempts=2 last_error=HTTP 500"));

    let item = write_to_item(&write);
    assert_eq!(item.status, "pending");
    assert_eq!(item.attempts, 2);
    assert!(!item.has_image);
}

#[test]
fn product_lines_mark_source() {
    let view = CatalogView::build(
        &[CatalogItem::new("Pen", "Office", 1.5, 5.0)],
        &[FavoriteOverride::new(CatalogItem::new("Mug", "Kitchen", 10.0, 12.0))],
        &[],
    );

    let lines = format_product_lines(view.entries());
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("* Mug"));
    assert!(lines[1].starts_with("  Pen"));
    assert!(lines[1].contains("1.50"));
}

#[test]
fn read_image_rejects_empty_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let empty = temp_dir.path().join("empty.jpg");
    std::fs::write(&empty, b"").unwrap();
    assert!(matches!(read_image(&empty), Err(CliError::EmptyImage(_))));

    let photo = temp_dir.path().join("photo.jpg");
    std::fs::write(&photo, [0xFF, 0xD8, 0xFF]).unwrap();
    assert_eq!(read_image(&photo).unwrap(), vec![0xFF, 0xD8, 0xFF]);
}

#[tokio::test(flavor = "current_thread")]
async fn pin_from_view_snapshots_listed_item() {
    let store = CatalogStore::open_in_memory().unwrap();
    let queued = PendingWrite::new(ProductPayload::new("Notebook", "Books", 5.0, 5.0).unwrap());
    let view = CatalogView::build(
        &[CatalogItem::new("Pen", "Office", 1.5, 5.0)],
        &[],
        &[queued],
    );
    assert_eq!(view.entries()[0].source, ItemSource::LocalPending);

    let pinned = pin_from_view(&store, &view, "Notebook").await.unwrap();
    assert_eq!(pinned.name(), "Notebook");
    assert!(store.is_favorite("Notebook").await.unwrap());

    assert!(matches!(
        pin_from_view(&store, &view, "Stapler").await,
        Err(CliError::ProductNotFound(_))
    ));
}

#[tokio::test(flavor = "current_thread")]
async fn local_commands_work_without_network() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("shelf.db");
    {
        let store = CatalogStore::open_path(&db_path).unwrap();
        store
            .enqueue_pending_write(&ProductPayload::new("Notebook", "Books", 5.0, 5.0).unwrap())
            .await
            .unwrap();
        store
            .upsert_favorite(&CatalogItem::new("Mug", "Kitchen", 10.0, 12.0))
            .await
            .unwrap();
    }

    let config = ShelfConfig::default();
    run_pending(false, true, &db_path).await.unwrap();
    run_pending(true, false, &db_path).await.unwrap();

    let favorites_only = ListArgs {
        favorites: true,
        ..ListArgs::default()
    };
    run_list(&favorites_only, &config, &db_path).await.unwrap();

    run_prune(Some(0), &config, &db_path).await.unwrap();
    run_unfavorite("Mug", &db_path).await.unwrap();

    let store = CatalogStore::open_path(&db_path).unwrap();
    assert!(!store.is_favorite("Mug").await.unwrap());
    assert_eq!(store.list_pending().await.unwrap().len(), 1);
}
