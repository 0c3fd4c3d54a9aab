//! Data models for Shelf

mod favorite;
mod pending_write;
mod product;

pub use favorite::FavoriteOverride;
pub use pending_write::{PendingWrite, PendingWriteId, WriteStatus};
pub use product::{CatalogItem, ProductPayload};
