//! Pending write repository implementation

use crate::error::{Error, Result};
use crate::models::{PendingWrite, PendingWriteId, ProductPayload, WriteStatus};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

const SELECT_COLUMNS: &str = "SELECT id, name, category, price, tax_rate, image, status,
        created_at, attempt_count, last_error, last_attempt_at, uploaded_at
     FROM pending_writes";

/// Trait for pending write queue operations
pub trait PendingWriteRepository {
    /// Queue a new write with status `pending`
    fn enqueue(&self, payload: &ProductPayload) -> Result<PendingWrite>;

    /// Get a write by ID, whatever its status
    fn get(&self, id: &PendingWriteId) -> Result<Option<PendingWrite>>;

    /// Move a write to `uploaded`. Returns `false` when it already was.
    fn mark_uploaded(&self, id: &PendingWriteId) -> Result<bool>;

    /// Record a failed submission attempt on a still-pending write
    fn record_failure(&self, id: &PendingWriteId, message: &str) -> Result<()>;

    /// List writes with status `pending`, oldest first
    fn list_pending(&self) -> Result<Vec<PendingWrite>>;

    /// List every write, oldest first
    fn list_all(&self) -> Result<Vec<PendingWrite>>;

    /// Delete uploaded writes accepted before `cutoff` (Unix ms)
    fn prune_uploaded_before(&self, cutoff: i64) -> Result<usize>;
}

/// `SQLite` implementation of `PendingWriteRepository`
pub struct SqlitePendingWriteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePendingWriteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn exists(&self, id: &PendingWriteId) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM pending_writes WHERE id = ?)",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Parse a pending write from a database row
    fn parse_write(row: &rusqlite::Row<'_>) -> rusqlite::Result<PendingWrite> {
        let id: String = row.get(0)?;
        let status: String = row.get(6)?;
        Ok(PendingWrite {
            id: id.parse().map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(error))
            })?,
            payload: ProductPayload {
                name: row.get(1)?,
                category: row.get(2)?,
                price: row.get(3)?,
                tax_rate: row.get(4)?,
                image: row.get(5)?,
            },
            status: status.parse::<WriteStatus>().map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(6, Type::Text, error.into())
            })?,
            created_at: row.get(7)?,
            attempt_count: row.get(8)?,
            last_error: row.get(9)?,
            last_attempt_at: row.get(10)?,
            uploaded_at: row.get(11)?,
        })
    }

    fn query_writes(&self, sql: &str) -> Result<Vec<PendingWrite>> {
        let mut stmt = self.conn.prepare(sql)?;
        let writes = stmt
            .query_map([], Self::parse_write)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(writes)
    }
}

impl PendingWriteRepository for SqlitePendingWriteRepository<'_> {
    fn enqueue(&self, payload: &ProductPayload) -> Result<PendingWrite> {
        payload.validate()?;
        let write = PendingWrite::new(payload.clone());

        self.conn.execute(
            "INSERT INTO pending_writes (id, name, category, price, tax_rate, image, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                write.id.as_str(),
                write.payload.name,
                write.payload.category,
                write.payload.price,
                write.payload.tax_rate,
                write.payload.image,
                write.status.as_str(),
                write.created_at,
            ],
        )?;

        Ok(write)
    }

    fn get(&self, id: &PendingWriteId) -> Result<Option<PendingWrite>> {
        let write = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?"),
                params![id.as_str()],
                Self::parse_write,
            )
            .optional()?;
        Ok(write)
    }

    fn mark_uploaded(&self, id: &PendingWriteId) -> Result<bool> {
        let now = chrono::Utc::now().timestamp_millis();

        let rows = self.conn.execute(
            "UPDATE pending_writes SET status = 'uploaded', uploaded_at = ?
             WHERE id = ? AND status = 'pending'",
            params![now, id.as_str()],
        )?;

        if rows > 0 {
            return Ok(true);
        }
        if self.exists(id)? {
            Ok(false)
        } else {
            Err(Error::NotFound(id.to_string()))
        }
    }

    fn record_failure(&self, id: &PendingWriteId, message: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        let rows = self.conn.execute(
            "UPDATE pending_writes
             SET attempt_count = attempt_count + 1, last_error = ?, last_attempt_at = ?
             WHERE id = ? AND status = 'pending'",
            params![message, now, id.as_str()],
        )?;

        if rows == 0 && !self.exists(id)? {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn list_pending(&self) -> Result<Vec<PendingWrite>> {
        self.query_writes(&format!(
            "{SELECT_COLUMNS} WHERE status = 'pending' ORDER BY created_at ASC, rowid ASC"
        ))
    }

    fn list_all(&self) -> Result<Vec<PendingWrite>> {
        self.query_writes(&format!("{SELECT_COLUMNS} ORDER BY created_at ASC, rowid ASC"))
    }

    fn prune_uploaded_before(&self, cutoff: i64) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM pending_writes WHERE status = 'uploaded' AND uploaded_at < ?",
            params![cutoff],
        )?;
        Ok(rows)
    }
}
