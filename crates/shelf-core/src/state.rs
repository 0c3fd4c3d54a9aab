//! Shared sync state types.

use std::fmt;

/// Sync state published by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// Connectivity is down; writes are only queued
    Offline,
    /// A flush is running
    Syncing,
    /// The last flush left nothing failed
    Synced,
    /// The last flush left failed writes or hit a storage error
    Error,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}
