//! Favorite override model

use serde::{Deserialize, Serialize};

use super::CatalogItem;

/// A user-pinned product.
///
/// Holds the catalog snapshot captured when the item was favorited; the
/// merged view shows this snapshot rather than the live remote copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteOverride {
    /// Cached catalog snapshot; `item.name` is the key
    pub item: CatalogItem,
    /// Always true while the row exists
    pub is_favorite: bool,
    /// When the snapshot was captured (Unix ms)
    pub favorited_at: i64,
}

impl FavoriteOverride {
    #[must_use]
    pub fn new(item: CatalogItem) -> Self {
        Self {
            item,
            is_favorite: true,
            favorited_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.item.name
    }
}
