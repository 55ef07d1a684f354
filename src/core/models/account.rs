use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::InventoryError;

/// The kind of provider an account belongs to. Selects the adapter
/// and the native status vocabulary used during sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    HetznerCloud,
    HetznerRobot,
    Aws,
    Scaleway,
    VsysHost,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        Self::HetznerCloud,
        Self::HetznerRobot,
        Self::Aws,
        Self::Scaleway,
        Self::VsysHost,
    ];

    /// Identifier used in config files and on the command line.
    pub fn ident(&self) -> &'static str {
        match self {
            Self::HetznerCloud => "hetzner_cloud",
            Self::HetznerRobot => "hetzner_robot",
            Self::Aws => "aws",
            Self::Scaleway => "scaleway",
            Self::VsysHost => "vsys_host",
        }
    }

    /// Human-readable name (e.g. "Hetzner Cloud").
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::HetznerCloud => "Hetzner Cloud",
            Self::HetznerRobot => "Hetzner Robot",
            Self::Aws => "AWS",
            Self::Scaleway => "Scaleway",
            Self::VsysHost => "Vsys Host",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ident())
    }
}

impl FromStr for ProviderKind {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.ident() == s)
            .ok_or_else(|| InventoryError::UnknownVariant {
                kind: "provider",
                value: s.to_string(),
                expected: Self::ALL
                    .iter()
                    .map(|k| k.ident())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Credentials handed to a provider adapter.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: Option<String>,
    pub api_key: String,
}

// Keep secrets out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("api_key", &"***")
            .finish()
    }
}

/// An account at a provider. Owns zero or more server records.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub provider: ProviderKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default)]
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("name", &self.name)
            .field("login", &self.login)
            .field("api_key", &"***")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl Account {
    /// True when the account has something a provider could authenticate with.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            login: self.login.clone().filter(|l| !l.is_empty()),
            api_key: self.api_key.clone(),
        }
    }
}

/// Fields for an account that has not been persisted yet.
#[derive(Clone, PartialEq)]
pub struct NewAccount {
    pub provider: ProviderKind,
    pub name: String,
    pub login: Option<String>,
    pub api_key: String,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("provider", &self.provider)
            .field("name", &self.name)
            .field("login", &self.login)
            .field("api_key", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(api_key: &str, login: Option<&str>) -> Account {
        Account {
            id: 1,
            provider: ProviderKind::HetznerRobot,
            name: "main".into(),
            login: login.map(str::to_string),
            api_key: api_key.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn provider_ident_round_trip() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.ident().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_provider_lists_valid_values() {
        let err = "digitalocean".parse::<ProviderKind>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("digitalocean"));
        assert!(msg.contains("hetzner_cloud"));
    }

    #[test]
    fn blank_api_key_means_no_credentials() {
        assert!(!account("   ", None).has_credentials());
        assert!(account("token", None).has_credentials());
    }

    #[test]
    fn empty_login_is_dropped_from_credentials() {
        let creds = account("secret", Some("")).credentials();
        assert_eq!(creds.login, None);
    }

    #[test]
    fn credentials_debug_hides_key() {
        let creds = account("super-secret", Some("robot")).credentials();
        let shown = format!("{creds:?}");
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("robot"));
    }

    #[test]
    fn account_debug_hides_key() {
        let shown = format!("{:?}", account("super-secret", Some("robot")));
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("main"));
    }
}
