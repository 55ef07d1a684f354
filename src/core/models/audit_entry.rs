use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::InventoryError;

/// Actions that get recorded in the server audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Added,
    Paused,
    Deleted,
    Synced,
    Updated,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Paused => "paused",
            Self::Deleted => "deleted",
            Self::Synced => "synced",
            Self::Updated => "updated",
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogAction {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(Self::Added),
            "paused" => Ok(Self::Paused),
            "deleted" => Ok(Self::Deleted),
            "synced" => Ok(Self::Synced),
            "updated" => Ok(Self::Updated),
            other => Err(InventoryError::UnknownVariant {
                kind: "log action",
                value: other.to_string(),
                expected: "added, paused, deleted, synced, updated".into(),
            }),
        }
    }
}

/// A single entry in the append-only audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: u64,
    pub server_id: u64,
    pub action: LogAction,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// An audit entry before the store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub server_id: u64,
    pub action: LogAction,
    pub description: String,
}
