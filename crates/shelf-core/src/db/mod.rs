//! Database layer for Shelf

mod connection;
mod favorite_repository;
mod migrations;
mod repository;

pub use connection::Database;
pub use favorite_repository::{FavoriteRepository, SqliteFavoriteRepository};
pub use repository::{PendingWriteRepository, SqlitePendingWriteRepository};
