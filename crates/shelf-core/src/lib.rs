//! shelf-core - Core library for Shelf
//!
//! Offline-first product catalog client: a durable queue of locally created
//! products, a sync engine that drains it whenever the catalog service is
//! reachable, and pure reconciliation of the fetched catalog with local
//! favorites and queued writes.

pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod remote;
pub mod services;
pub mod state;
pub mod sync;

pub use config::ShelfConfig;
pub use connectivity::{ConnectivityEvent, ConnectivityMonitor, ConnectivityProbe, TcpProbe};
pub use error::{Error, Result};
pub use models::{
    CatalogItem, FavoriteOverride, PendingWrite, PendingWriteId, ProductPayload, WriteStatus,
};
pub use reconcile::{CatalogView, ItemSource, ListedProduct};
pub use remote::{CatalogRemote, FetchError, HttpCatalogClient, SubmitError};
pub use services::CatalogStore;
pub use state::SyncState;
pub use sync::{FlushReport, ProductSubmission, SyncEngine, SyncEvent, SyncOptions};
