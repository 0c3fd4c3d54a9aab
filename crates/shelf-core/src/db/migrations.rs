//! Database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Apply a list of statements atomically. The transaction rolls back on drop
/// if any statement fails.
fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for stmt in statements {
        tx.execute_batch(stmt)?;
    }
    tx.commit()?;
    Ok(())
}

/// Migration to version 1: pending write queue and favorites
fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            "CREATE TABLE IF NOT EXISTS pending_writes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                price REAL NOT NULL,
                tax_rate REAL NOT NULL,
                image BLOB,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'uploaded')),
                created_at INTEGER NOT NULL,
                uploaded_at INTEGER
            )",
            "CREATE INDEX IF NOT EXISTS idx_pending_writes_status_created
                ON pending_writes(status, created_at)",
            // Status may only move forward.
            "CREATE TRIGGER IF NOT EXISTS pending_writes_status_guard
             BEFORE UPDATE OF status ON pending_writes
             FOR EACH ROW
             WHEN OLD.status = 'uploaded' AND NEW.status = 'pending'
             BEGIN
                 SELECT RAISE(ABORT, 'pending write status cannot move back to pending');
             END",
            "CREATE TABLE IF NOT EXISTS favorites (
                name TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                price REAL NOT NULL,
                tax_rate REAL NOT NULL,
                image_ref TEXT,
                is_favorite INTEGER NOT NULL DEFAULT 1,
                favorited_at INTEGER NOT NULL
            )",
            "INSERT INTO schema_version (version) VALUES (1)",
        ],
    )?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: failed attempt bookkeeping on pending writes
fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "ALTER TABLE pending_writes ADD COLUMN attempt_count INTEGER NOT NULL DEFAULT 0",
            "ALTER TABLE pending_writes ADD COLUMN last_error TEXT",
            "ALTER TABLE pending_writes ADD COLUMN last_attempt_at INTEGER",
            "INSERT INTO schema_version (version) VALUES (2)",
        ],
    )?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
