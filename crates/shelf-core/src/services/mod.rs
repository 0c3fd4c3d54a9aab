//! Shared service handles used across clients.

mod catalog_store;

pub use catalog_store::CatalogStore;
