//! Favorite override repository implementation

use crate::error::Result;
use crate::models::{CatalogItem, FavoriteOverride};
use rusqlite::{params, Connection, OptionalExtension};

/// Trait for favorite override storage operations
pub trait FavoriteRepository {
    /// Insert or replace the cached snapshot for `item.name`
    fn upsert(&self, item: &CatalogItem) -> Result<FavoriteOverride>;

    /// Remove a favorite. Returns `false` when none existed.
    fn remove(&self, name: &str) -> Result<bool>;

    /// Get a favorite by name
    fn get(&self, name: &str) -> Result<Option<FavoriteOverride>>;

    /// List favorites ordered by name
    fn list(&self) -> Result<Vec<FavoriteOverride>>;

    /// Flip the favorite state of `item`, returning the new state
    fn toggle(&self, item: &CatalogItem) -> Result<bool>;
}

/// `SQLite` implementation of `FavoriteRepository`
pub struct SqliteFavoriteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteFavoriteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_favorite(row: &rusqlite::Row<'_>) -> rusqlite::Result<FavoriteOverride> {
        Ok(FavoriteOverride {
            item: CatalogItem {
                name: row.get(0)?,
                category: row.get(1)?,
                price: row.get(2)?,
                tax_rate: row.get(3)?,
                image_ref: row.get(4)?,
            },
            is_favorite: row.get::<_, i32>(5)? != 0,
            favorited_at: row.get(6)?,
        })
    }

    fn upsert_on(conn: &Connection, item: &CatalogItem) -> Result<FavoriteOverride> {
        let favorite = FavoriteOverride::new(item.clone());
        conn.execute(
            "INSERT INTO favorites (name, category, price, tax_rate, image_ref, is_favorite, favorited_at)
             VALUES (?, ?, ?, ?, ?, 1, ?)
             ON CONFLICT(name) DO UPDATE SET
                category = excluded.category,
                price = excluded.price,
                tax_rate = excluded.tax_rate,
                image_ref = excluded.image_ref,
                is_favorite = 1,
                favorited_at = excluded.favorited_at",
            params![
                favorite.item.name,
                favorite.item.category,
                favorite.item.price,
                favorite.item.tax_rate,
                favorite.item.image_ref,
                favorite.favorited_at,
            ],
        )?;
        Ok(favorite)
    }
}

impl FavoriteRepository for SqliteFavoriteRepository<'_> {
    fn upsert(&self, item: &CatalogItem) -> Result<FavoriteOverride> {
        Self::upsert_on(self.conn, item)
    }

    fn remove(&self, name: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM favorites WHERE name = ?", params![name])?;
        Ok(rows > 0)
    }

    fn get(&self, name: &str) -> Result<Option<FavoriteOverride>> {
        let favorite = self
            .conn
            .query_row(
                "SELECT name, category, price, tax_rate, image_ref, is_favorite, favorited_at
                 FROM favorites WHERE name = ?",
                params![name],
                Self::parse_favorite,
            )
            .optional()?;
        Ok(favorite)
    }

    fn list(&self) -> Result<Vec<FavoriteOverride>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, category, price, tax_rate, image_ref, is_favorite, favorited_at
             FROM favorites
             ORDER BY name ASC",
        )?;

        let favorites = stmt
            .query_map([], Self::parse_favorite)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(favorites)
    }

    fn toggle(&self, item: &CatalogItem) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM favorites WHERE name = ?", params![item.name])?;
        let now_favorite = if removed > 0 {
            false
        } else {
            Self::upsert_on(&tx, item)?;
            true
        };
        tx.commit()?;
        Ok(now_favorite)
    }
}
