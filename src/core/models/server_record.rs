use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::InventoryError;

/// Lifecycle state of a server in the local inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Active,
    Paused,
    Deleted,
}

impl ServerStatus {
    pub const ALL: [ServerStatus; 3] = [Self::Active, Self::Paused, Self::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerStatus {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "deleted" => Ok(Self::Deleted),
            other => Err(InventoryError::UnknownVariant {
                kind: "server status",
                value: other.to_string(),
                expected: "active, paused, deleted".into(),
            }),
        }
    }
}

/// A server as stored in the local inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: u64,
    pub account_id: u64,
    pub name: String,
    pub ip: String,
    pub location: String,
    pub description: String,
    /// Free text maintained by people; sync never writes it.
    pub responsible: String,
    pub approximate_cost: f64,
    pub backups_enabled: bool,
    pub status: ServerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a server that has not been persisted yet.
/// The store assigns `id` and timestamps on create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewServer {
    pub account_id: u64,
    pub name: String,
    pub ip: String,
    pub location: String,
    pub description: String,
    pub responsible: String,
    pub approximate_cost: f64,
    pub backups_enabled: bool,
    pub status: ServerStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_table_is_total() {
        for status in ServerStatus::ALL {
            let parsed: ServerStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_status_is_typed_error() {
        let err = "archived".parse::<ServerStatus>().unwrap_err();
        assert!(matches!(
            err,
            InventoryError::UnknownVariant { kind: "server status", .. }
        ));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ServerStatus::Paused).unwrap();
        assert_eq!(json, "\"paused\"");
    }
}
