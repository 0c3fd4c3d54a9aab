//! Catalog reconciliation.
//!
//! Pure functions that merge the fetched catalog with local favorites and
//! queued writes into one de-duplicated, display-ready list. Inputs are
//! immutable snapshots, so everything here is safe to call from any thread.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::models::{CatalogItem, FavoriteOverride, PendingWrite};

/// Where a listed product came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    /// Pinned locally; shows the cached snapshot
    Favorite,
    /// Latest remote catalog
    Remote,
    /// Created locally and not yet accepted by the server
    LocalPending,
}

/// A product as presented in the merged list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedProduct {
    pub item: CatalogItem,
    pub source: ItemSource,
}

impl ListedProduct {
    #[must_use]
    pub fn is_favorite(&self) -> bool {
        self.source == ItemSource::Favorite
    }
}

/// Drop repeated names, keeping the first occurrence.
#[must_use]
pub fn dedupe_by_name(items: &[CatalogItem]) -> Vec<CatalogItem> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.name.as_str()))
        .cloned()
        .collect()
}

/// Merge the remote catalog with favorites.
///
/// Favorites come first (name ascending) using their cached snapshot; the
/// remaining remote items follow, de-duplicated and sorted by name.
#[must_use]
pub fn merge(remote: &[CatalogItem], favorites: &[FavoriteOverride]) -> Vec<CatalogItem> {
    reconcile(remote, favorites, &[])
        .into_iter()
        .map(|listed| listed.item)
        .collect()
}

/// Merge remote items, favorites, and still-pending local writes.
///
/// Ordering matches [`merge`]. Pending writes whose name is not already
/// listed are interleaved with the remote block by name. Uploaded writes are
/// never listed; the remote copy replaces them.
#[must_use]
pub fn reconcile(
    remote: &[CatalogItem],
    favorites: &[FavoriteOverride],
    pending: &[PendingWrite],
) -> Vec<ListedProduct> {
    let mut pinned: Vec<&FavoriteOverride> = favorites.iter().collect();
    pinned.sort_by(|a, b| a.name().cmp(b.name()));

    let mut seen: HashSet<&str> = HashSet::new();
    let mut listed: Vec<ListedProduct> = pinned
        .into_iter()
        .filter(|favorite| seen.insert(favorite.name()))
        .map(|favorite| ListedProduct {
            item: favorite.item.clone(),
            source: ItemSource::Favorite,
        })
        .collect();

    let mut rest: Vec<ListedProduct> = remote
        .iter()
        .filter(|item| seen.insert(item.name.as_str()))
        .map(|item| ListedProduct {
            item: item.clone(),
            source: ItemSource::Remote,
        })
        .collect();

    rest.extend(
        pending
            .iter()
            .filter(|write| write.is_pending())
            .filter(|write| seen.insert(write.payload.name.as_str()))
            .map(|write| ListedProduct {
                item: write.payload.to_catalog_item(),
                source: ItemSource::LocalPending,
            }),
    );
    rest.sort_by(|a, b| a.item.name.cmp(&b.item.name));

    listed.extend(rest);
    listed
}

/// Keep items whose name contains `search_text` (case-insensitive) and whose
/// type is in `selected_types`. Empty search text or an empty type set
/// matches everything.
#[must_use]
pub fn filter(
    items: &[CatalogItem],
    search_text: &str,
    selected_types: &BTreeSet<String>,
) -> Vec<CatalogItem> {
    let query = normalize_query(search_text);
    items
        .iter()
        .filter(|item| matches_item(item, &query, selected_types))
        .cloned()
        .collect()
}

/// [`filter`] applied to the favorites list.
#[must_use]
pub fn filter_favorites(
    favorites: &[FavoriteOverride],
    search_text: &str,
    selected_types: &BTreeSet<String>,
) -> Vec<FavoriteOverride> {
    let query = normalize_query(search_text);
    favorites
        .iter()
        .filter(|favorite| favorite.is_favorite)
        .filter(|favorite| matches_item(&favorite.item, &query, selected_types))
        .cloned()
        .collect()
}

/// Distinct product types, sorted.
#[must_use]
pub fn product_types(items: &[CatalogItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Lowercased query. Whitespace is part of the query, so only `""` matches
/// every name.
fn normalize_query(raw: &str) -> String {
    raw.to_lowercase()
}

fn matches_item(item: &CatalogItem, query: &str, selected_types: &BTreeSet<String>) -> bool {
    let matches_search = query.is_empty() || item.name.to_lowercase().contains(query);
    let matches_type = selected_types.is_empty() || selected_types.contains(&item.category);
    matches_search && matches_type
}

/// Snapshot of the merged catalog ready for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogView {
    entries: Vec<ListedProduct>,
    types: Vec<String>,
}

impl CatalogView {
    #[must_use]
    pub fn build(
        remote: &[CatalogItem],
        favorites: &[FavoriteOverride],
        pending: &[PendingWrite],
    ) -> Self {
        let entries = reconcile(remote, favorites, pending);
        let items: Vec<CatalogItem> = entries.iter().map(|entry| entry.item.clone()).collect();
        Self {
            types: product_types(&items),
            entries,
        }
    }

    pub fn entries(&self) -> &[ListedProduct] {
        &self.entries
    }

    /// Filter chips: every type present in the merged list.
    pub fn product_types(&self) -> &[String] {
        &self.types
    }

    /// Entries matching the search text and type selection.
    #[must_use]
    pub fn filtered(
        &self,
        search_text: &str,
        selected_types: &BTreeSet<String>,
    ) -> Vec<ListedProduct> {
        let query = normalize_query(search_text);
        self.entries
            .iter()
            .filter(|entry| matches_item(&entry.item, &query, selected_types))
            .cloned()
            .collect()
    }

    /// Only the pinned entries.
    pub fn favorites(&self) -> impl Iterator<Item = &ListedProduct> {
        self.entries.iter().filter(|entry| entry.is_favorite())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
