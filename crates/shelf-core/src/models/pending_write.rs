//! Pending write model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ProductPayload;

/// A unique identifier for a pending write, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PendingWriteId(Uuid);

impl PendingWriteId {
    /// Create a new unique id using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for PendingWriteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PendingWriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PendingWriteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Upload status of a queued write. Only ever moves `Pending` -> `Uploaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteStatus {
    Pending,
    Uploaded,
}

impl WriteStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploaded => "uploaded",
        }
    }
}

impl fmt::Display for WriteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "uploaded" => Ok(Self::Uploaded),
            other => Err(format!("unknown write status: {other}")),
        }
    }
}

/// A locally created product awaiting server confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    /// Unique identifier
    pub id: PendingWriteId,
    /// Product data to submit
    pub payload: ProductPayload,
    /// Upload status
    pub status: WriteStatus,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Number of failed submission attempts
    pub attempt_count: u32,
    /// Most recent failure message, kept for inspection
    pub last_error: Option<String>,
    /// Timestamp of the most recent failed attempt (Unix ms)
    pub last_attempt_at: Option<i64>,
    /// Timestamp of server acceptance (Unix ms)
    pub uploaded_at: Option<i64>,
}

impl PendingWrite {
    /// Create a new pending write for the given payload
    #[must_use]
    pub fn new(payload: ProductPayload) -> Self {
        Self {
            id: PendingWriteId::new(),
            payload,
            status: WriteStatus::Pending,
            created_at: chrono::Utc::now().timestamp_millis(),
            attempt_count: 0,
            last_error: None,
            last_attempt_at: None,
            uploaded_at: None,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == WriteStatus::Pending
    }
}
