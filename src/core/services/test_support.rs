//! Doubles shared by the service tests.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::adapters::store::json_store::JsonInventoryStore;
use crate::core::errors::{InventoryError, Result};
use crate::core::models::account::{Account, Credentials, NewAccount, ProviderKind};
use crate::core::models::audit_entry::{AuditLogEntry, NewAuditEntry};
use crate::core::models::server_record::{NewServer, ServerRecord, ServerStatus};
use crate::core::models::snapshot::RemoteServerSnapshot;
use crate::core::traits::inventory_store::InventoryStore;
use crate::core::traits::provider::ServerProvider;

/// Add an account with a non-empty key and return its id.
pub fn seed_account(store: &JsonInventoryStore, provider: ProviderKind, name: &str) -> u64 {
    store
        .add_account(NewAccount {
            provider,
            name: name.to_string(),
            login: None,
            api_key: format!("{name}-token"),
        })
        .unwrap()
        .id
}

pub fn seed_server(
    store: &JsonInventoryStore,
    account_id: u64,
    name: &str,
    ip: &str,
    status: ServerStatus,
) -> ServerRecord {
    store
        .create_server(NewServer {
            account_id,
            name: name.to_string(),
            ip: ip.to_string(),
            location: "Nuremberg, DE".to_string(),
            description: "CX22".to_string(),
            responsible: String::new(),
            approximate_cost: 10.0,
            backups_enabled: false,
            status,
        })
        .unwrap()
}

/// A priced snapshot whose other fields line up with `seed_server`.
pub fn snapshot(name: &str, ip: Option<&str>, status: &str) -> RemoteServerSnapshot {
    RemoteServerSnapshot {
        remote_id: None,
        name: name.to_string(),
        ip: ip.map(str::to_string),
        location: "Nuremberg, DE".to_string(),
        description: "CX22".to_string(),
        monthly_cost: Some(10.0),
        native_status: status.to_string(),
        cancelled: false,
        has_backups: Some(false),
    }
}

/// Provider returning a fixed inventory, or a transport failure.
pub struct StaticProvider {
    kind: ProviderKind,
    response: Mutex<std::result::Result<Vec<RemoteServerSnapshot>, String>>,
    calls: Mutex<usize>,
}

impl StaticProvider {
    pub fn returning(kind: ProviderKind, servers: Vec<RemoteServerSnapshot>) -> Self {
        Self {
            kind,
            response: Mutex::new(Ok(servers)),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(kind: ProviderKind, detail: &str) -> Self {
        Self {
            kind,
            response: Mutex::new(Err(detail.to_string())),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl ServerProvider for StaticProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn list_servers(&self, _credentials: &Credentials) -> Result<Vec<RemoteServerSnapshot>> {
        *self.calls.lock() += 1;
        self.response
            .lock()
            .clone()
            .map_err(|detail| InventoryError::Transport {
                provider: self.kind.display_name().to_string(),
                detail,
            })
    }
}

/// Store wrapper that fails writes for chosen server names.
pub struct FaultyStore<'a> {
    pub inner: &'a JsonInventoryStore,
    pub fail_create: HashSet<String>,
    pub fail_update: HashSet<String>,
    pub fail_lookup: HashSet<String>,
}

impl<'a> FaultyStore<'a> {
    pub fn new(inner: &'a JsonInventoryStore) -> Self {
        Self {
            inner,
            fail_create: HashSet::new(),
            fail_update: HashSet::new(),
            fail_lookup: HashSet::new(),
        }
    }

    fn storage_error(what: &str) -> InventoryError {
        InventoryError::Storage {
            detail: format!("injected failure: {what}"),
        }
    }
}

impl InventoryStore for FaultyStore<'_> {
    fn list_accounts_with_credentials(&self) -> Result<Vec<Account>> {
        self.inner.list_accounts_with_credentials()
    }

    fn find_servers_by_ip(&self, account_id: u64, ip: &str) -> Result<Vec<ServerRecord>> {
        self.inner.find_servers_by_ip(account_id, ip)
    }

    fn find_servers_by_name(&self, account_id: u64, name: &str) -> Result<Vec<ServerRecord>> {
        if self.fail_lookup.contains(name) {
            return Err(Self::storage_error(name));
        }
        self.inner.find_servers_by_name(account_id, name)
    }

    fn list_servers_by_account(&self, account_id: u64) -> Result<Vec<ServerRecord>> {
        self.inner.list_servers_by_account(account_id)
    }

    fn create_server(&self, server: NewServer) -> Result<ServerRecord> {
        if self.fail_create.contains(&server.name) {
            return Err(Self::storage_error(&server.name));
        }
        self.inner.create_server(server)
    }

    fn update_server(&self, server: &ServerRecord) -> Result<ServerRecord> {
        if self.fail_update.contains(&server.name) {
            return Err(Self::storage_error(&server.name));
        }
        self.inner.update_server(server)
    }

    fn append_audit_log(&self, entry: NewAuditEntry) -> Result<AuditLogEntry> {
        self.inner.append_audit_log(entry)
    }
}
