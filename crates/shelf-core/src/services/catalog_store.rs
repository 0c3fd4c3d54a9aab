//! Shared local store handle used by the sync engine and clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::db::{
    Database, FavoriteRepository, PendingWriteRepository, SqliteFavoriteRepository,
    SqlitePendingWriteRepository,
};
use crate::models::{CatalogItem, FavoriteOverride, PendingWrite, PendingWriteId, ProductPayload};
use crate::Result;

/// Thread-safe handle over the durable store.
///
/// Every operation takes the same lock, so writes are serialized through a
/// single connection. Clones share the underlying database.
#[derive(Clone)]
pub struct CatalogStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl CatalogStore {
    /// Open the store at the given filesystem path, creating parent directories.
    pub fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::debug!("Opening local store at {}", db_path.display());
        let db = Database::open(&db_path)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Path of the backing database file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Durably queue a new product with status `pending`.
    pub async fn enqueue_pending_write(&self, payload: &ProductPayload) -> Result<PendingWrite> {
        let db = self.db.lock().await;
        let repo = SqlitePendingWriteRepository::new(db.connection());
        let write = repo.enqueue(payload)?;
        tracing::debug!("Queued pending write {} ({})", write.id, write.payload.name);
        Ok(write)
    }

    /// Mark a write as accepted by the server. Idempotent.
    pub async fn mark_uploaded(&self, id: &PendingWriteId) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = SqlitePendingWriteRepository::new(db.connection());
        repo.mark_uploaded(id)
    }

    /// Record a failed submission attempt; the write stays pending.
    pub async fn record_failure(&self, id: &PendingWriteId, message: &str) -> Result<()> {
        let db = self.db.lock().await;
        let repo = SqlitePendingWriteRepository::new(db.connection());
        repo.record_failure(id, message)
    }

    /// Fetch a write by id.
    pub async fn get_pending_write(&self, id: &PendingWriteId) -> Result<Option<PendingWrite>> {
        let db = self.db.lock().await;
        let repo = SqlitePendingWriteRepository::new(db.connection());
        repo.get(id)
    }

    /// List pending writes, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<PendingWrite>> {
        let db = self.db.lock().await;
        let repo = SqlitePendingWriteRepository::new(db.connection());
        repo.list_pending()
    }

    /// List every write including uploaded ones, oldest first.
    pub async fn list_writes(&self) -> Result<Vec<PendingWrite>> {
        let db = self.db.lock().await;
        let repo = SqlitePendingWriteRepository::new(db.connection());
        repo.list_all()
    }

    /// Delete uploaded writes accepted more than `older_than` ago.
    pub async fn prune_uploaded(&self, older_than: Duration) -> Result<usize> {
        let age_ms = i64::try_from(older_than.as_millis()).unwrap_or(i64::MAX);
        let cutoff = chrono::Utc::now()
            .timestamp_millis()
            .saturating_sub(age_ms);

        let db = self.db.lock().await;
        let repo = SqlitePendingWriteRepository::new(db.connection());
        let removed = repo.prune_uploaded_before(cutoff)?;
        if removed > 0 {
            tracing::info!("Pruned {removed} uploaded writes");
        }
        Ok(removed)
    }

    /// Pin an item, replacing any cached snapshot.
    pub async fn upsert_favorite(&self, item: &CatalogItem) -> Result<FavoriteOverride> {
        let db = self.db.lock().await;
        let repo = SqliteFavoriteRepository::new(db.connection());
        repo.upsert(item)
    }

    /// Unpin an item. Idempotent.
    pub async fn remove_favorite(&self, name: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = SqliteFavoriteRepository::new(db.connection());
        repo.remove(name)
    }

    /// Flip the favorite state of an item, returning the new state.
    pub async fn toggle_favorite(&self, item: &CatalogItem) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = SqliteFavoriteRepository::new(db.connection());
        repo.toggle(item)
    }

    /// Whether an item with this name is pinned.
    pub async fn is_favorite(&self, name: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = SqliteFavoriteRepository::new(db.connection());
        Ok(repo.get(name)?.is_some())
    }

    /// List favorites ordered by name.
    pub async fn list_favorites(&self) -> Result<Vec<FavoriteOverride>> {
        let db = self.db.lock().await;
        let repo = SqliteFavoriteRepository::new(db.connection());
        repo.list()
    }
}
