use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::core::errors::{InventoryError, Result};
use crate::core::models::account::{Account, NewAccount};
use crate::core::models::audit_entry::{AuditLogEntry, LogAction, NewAuditEntry};
use crate::core::models::server_record::{NewServer, ServerRecord, ServerStatus};
use crate::core::traits::inventory_store::InventoryStore;

/// Everything the store holds, as written to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct InventoryState {
    next_account_id: u64,
    next_server_id: u64,
    next_audit_id: u64,
    accounts: Vec<Account>,
    servers: BTreeMap<u64, ServerRecord>,
    audit_log: Vec<AuditLogEntry>,
}

impl InventoryState {
    fn allocate(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }

    fn push_audit(&mut self, entry: NewAuditEntry) -> AuditLogEntry {
        let logged = AuditLogEntry {
            id: Self::allocate(&mut self.next_audit_id),
            server_id: entry.server_id,
            action: entry.action,
            description: entry.description,
            created_at: Utc::now(),
        };
        self.audit_log.push(logged.clone());
        logged
    }

    fn server_mut(&mut self, id: u64) -> Result<&mut ServerRecord> {
        self.servers.get_mut(&id).ok_or_else(|| InventoryError::NotFound {
            entity: "Server",
            id: id.to_string(),
        })
    }
}

/// Filters for listing servers. `None` means "any".
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerFilter {
    pub account_id: Option<u64>,
    pub status: Option<ServerStatus>,
}

/// Filters for reading the audit log.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditQuery {
    pub server_id: Option<u64>,
    pub action: Option<LogAction>,
    /// Keep only the newest N matching entries.
    pub last: Option<usize>,
}

/// Manual changes to a server. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerEdit {
    pub name: Option<String>,
    pub ip: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub responsible: Option<String>,
    pub approximate_cost: Option<f64>,
    pub backups_enabled: Option<bool>,
}

impl ServerEdit {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(InventoryError::InvalidInput {
                detail: "nothing to change, pass at least one field".into(),
            });
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(InventoryError::InvalidInput {
                detail: "server name cannot be empty".into(),
            });
        }
        if let Some(cost) = self.approximate_cost
            && !(cost.is_finite() && cost >= 0.0)
        {
            return Err(InventoryError::InvalidInput {
                detail: format!("approximate cost must be a non-negative number, got {cost}"),
            });
        }
        Ok(())
    }

    fn apply_to(self, server: &mut ServerRecord) {
        if let Some(name) = self.name {
            server.name = name.trim().to_string();
        }
        if let Some(ip) = self.ip {
            server.ip = ip.trim().to_string();
        }
        if let Some(location) = self.location {
            server.location = location;
        }
        if let Some(description) = self.description {
            server.description = description;
        }
        if let Some(responsible) = self.responsible {
            server.responsible = responsible;
        }
        if let Some(cost) = self.approximate_cost {
            server.approximate_cost = cost;
        }
        if let Some(backups) = self.backups_enabled {
            server.backups_enabled = backups;
        }
    }
}

/// Audit action for a status set by hand.
fn manual_status_action(status: ServerStatus) -> LogAction {
    match status {
        ServerStatus::Paused => LogAction::Paused,
        ServerStatus::Deleted => LogAction::Deleted,
        ServerStatus::Active => LogAction::Updated,
    }
}

/// Inventory store backed by a single JSON document.
///
/// Reads share a `RwLock`; every write takes it exclusively, builds the
/// next state on a copy, persists it to a temp file in the same directory
/// and renames it over the old file. The in-memory state is only swapped
/// once the rename succeeded, so a failed write leaves both untouched.
pub struct JsonInventoryStore {
    path: Option<PathBuf>,
    state: RwLock<InventoryState>,
}

impl JsonInventoryStore {
    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(InventoryState::default()),
        }
    }

    /// Open the store at `path`. A missing file is an empty inventory;
    /// it is created on the first write.
    pub fn open(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            let content = fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| InventoryError::Storage {
                detail: format!("Malformed inventory file {}: {e}", path.display()),
            })?
        } else {
            InventoryState::default()
        };

        tracing::debug!(path = %path.display(), "opened inventory store");
        Ok(Self {
            path: Some(path.to_path_buf()),
            state: RwLock::new(state),
        })
    }

    /// Open the store and make sure its file exists on disk.
    pub fn create(path: &Path) -> Result<Self> {
        let store = Self::open(path)?;
        if !path.exists() {
            store.persist(&store.state.read())?;
        }
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn add_account(&self, account: NewAccount) -> Result<Account> {
        let name = account.name.trim().to_string();
        if name.is_empty() {
            return Err(InventoryError::InvalidConfig {
                detail: "account name cannot be empty".into(),
            });
        }

        self.write(|state| {
            if state
                .accounts
                .iter()
                .any(|a| a.provider == account.provider && a.name == name)
            {
                return Err(InventoryError::InvalidConfig {
                    detail: format!(
                        "an account named '{name}' already exists for {}",
                        account.provider.display_name()
                    ),
                });
            }

            let now = Utc::now();
            let created = Account {
                id: InventoryState::allocate(&mut state.next_account_id),
                provider: account.provider,
                name,
                login: account.login.filter(|l| !l.trim().is_empty()),
                api_key: account.api_key,
                created_at: now,
                updated_at: now,
            };
            state.accounts.push(created.clone());
            Ok(created)
        })
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.state.read().accounts.clone())
    }

    pub fn get_server(&self, id: u64) -> Result<ServerRecord> {
        self.state
            .read()
            .servers
            .get(&id)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound {
                entity: "Server",
                id: id.to_string(),
            })
    }

    pub fn list_servers(&self, filter: ServerFilter) -> Result<Vec<ServerRecord>> {
        Ok(self
            .state
            .read()
            .servers
            .values()
            .filter(|s| filter.account_id.is_none_or(|id| s.account_id == id))
            .filter(|s| filter.status.is_none_or(|st| s.status == st))
            .cloned()
            .collect())
    }

    /// Apply a manual edit and log it as `updated`, in one write.
    pub fn edit_server(&self, id: u64, edit: ServerEdit) -> Result<ServerRecord> {
        edit.validate()?;
        self.write(|state| {
            let server = state.server_mut(id)?;
            edit.apply_to(server);
            server.updated_at = Utc::now();
            let saved = server.clone();
            state.push_audit(NewAuditEntry {
                server_id: id,
                action: LogAction::Updated,
                description: "Server updated".into(),
            });
            Ok(saved)
        })
    }

    /// Set the status by hand. Logged as `paused`, `deleted` or `updated`.
    pub fn set_server_status(&self, id: u64, status: ServerStatus) -> Result<ServerRecord> {
        self.write(|state| {
            let server = state.server_mut(id)?;
            server.status = status;
            server.updated_at = Utc::now();
            let saved = server.clone();
            state.push_audit(NewAuditEntry {
                server_id: id,
                action: manual_status_action(status),
                description: format!("Status changed to {status}"),
            });
            Ok(saved)
        })
    }

    /// The whole audit log, oldest first.
    pub fn audit_log(&self) -> Result<Vec<AuditLogEntry>> {
        self.query_audit_log(AuditQuery::default())
    }

    pub fn query_audit_log(&self, query: AuditQuery) -> Result<Vec<AuditLogEntry>> {
        let state = self.state.read();
        let mut entries: Vec<AuditLogEntry> = state
            .audit_log
            .iter()
            .filter(|e| query.server_id.is_none_or(|id| e.server_id == id))
            .filter(|e| query.action.is_none_or(|a| e.action == a))
            .cloned()
            .collect();

        if let Some(n) = query.last
            && entries.len() > n
        {
            entries.drain(..entries.len() - n);
        }
        Ok(entries)
    }

    fn servers_where(
        &self,
        account_id: u64,
        pred: impl Fn(&ServerRecord) -> bool,
    ) -> Vec<ServerRecord> {
        self.state
            .read()
            .servers
            .values()
            .filter(|s| s.account_id == account_id && pred(s))
            .cloned()
            .collect()
    }

    /// Apply `f` to a copy of the state, persist the copy, then swap it in.
    fn write<T>(&self, f: impl FnOnce(&mut InventoryState) -> Result<T>) -> Result<T> {
        let mut guard = self.state.write();
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(out)
    }

    fn persist(&self, state: &InventoryState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(state).map_err(|e| InventoryError::Storage {
            detail: format!("Failed to serialize inventory: {e}"),
        })?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| InventoryError::Storage {
            detail: format!("Cannot write inventory to {}: {}", path.display(), e.error),
        })?;
        Ok(())
    }
}

impl InventoryStore for JsonInventoryStore {
    fn list_accounts_with_credentials(&self) -> Result<Vec<Account>> {
        Ok(self
            .state
            .read()
            .accounts
            .iter()
            .filter(|a| a.has_credentials())
            .cloned()
            .collect())
    }

    fn find_servers_by_ip(&self, account_id: u64, ip: &str) -> Result<Vec<ServerRecord>> {
        Ok(self.servers_where(account_id, |s| s.ip == ip))
    }

    fn find_servers_by_name(&self, account_id: u64, name: &str) -> Result<Vec<ServerRecord>> {
        Ok(self.servers_where(account_id, |s| s.name == name))
    }

    fn list_servers_by_account(&self, account_id: u64) -> Result<Vec<ServerRecord>> {
        Ok(self.servers_where(account_id, |_| true))
    }

    fn create_server(&self, server: NewServer) -> Result<ServerRecord> {
        self.write(|state| {
            let now = Utc::now();
            let record = ServerRecord {
                id: InventoryState::allocate(&mut state.next_server_id),
                account_id: server.account_id,
                name: server.name,
                ip: server.ip,
                location: server.location,
                description: server.description,
                responsible: server.responsible,
                approximate_cost: server.approximate_cost,
                backups_enabled: server.backups_enabled,
                status: server.status,
                created_at: now,
                updated_at: now,
            };
            state.servers.insert(record.id, record.clone());
            Ok(record)
        })
    }

    fn update_server(&self, server: &ServerRecord) -> Result<ServerRecord> {
        // Nothing changed: skip the rewrite and keep `updated_at`.
        if let Some(stored) = self.state.read().servers.get(&server.id)
            && same_content(stored, server)
        {
            return Ok(stored.clone());
        }

        self.write(|state| {
            let stored = state.server_mut(server.id)?;

            let created_at = stored.created_at;
            *stored = ServerRecord {
                created_at,
                updated_at: Utc::now(),
                ..server.clone()
            };
            Ok(stored.clone())
        })
    }

    fn append_audit_log(&self, entry: NewAuditEntry) -> Result<AuditLogEntry> {
        self.write(|state| Ok(state.push_audit(entry)))
    }
}

/// Equal in everything but timestamps.
fn same_content(stored: &ServerRecord, incoming: &ServerRecord) -> bool {
    *stored
        == ServerRecord {
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            ..incoming.clone()
        }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::account::ProviderKind;
    use tempfile::TempDir;

    fn new_account(name: &str) -> NewAccount {
        NewAccount {
            provider: ProviderKind::HetznerCloud,
            name: name.into(),
            login: None,
            api_key: "token".into(),
        }
    }

    fn new_server(account_id: u64, name: &str, ip: &str) -> NewServer {
        NewServer {
            account_id,
            name: name.into(),
            ip: ip.into(),
            location: "Falkenstein, DE".into(),
            description: "CPX11".into(),
            responsible: String::new(),
            approximate_cost: 5.0,
            backups_enabled: false,
            status: ServerStatus::Active,
        }
    }

    #[test]
    fn state_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inventory.json");

        let store = JsonInventoryStore::open(&path).unwrap();
        let acc = store.add_account(new_account("main")).unwrap();
        let web = store.create_server(new_server(acc.id, "web1", "1.2.3.4")).unwrap();
        store
            .append_audit_log(NewAuditEntry {
                server_id: web.id,
                action: LogAction::Added,
                description: "Added from Hetzner Cloud sync".into(),
            })
            .unwrap();
        drop(store);

        let reopened = JsonInventoryStore::open(&path).unwrap();
        assert_eq!(reopened.list_accounts().unwrap(), vec![acc]);
        assert_eq!(reopened.get_server(web.id).unwrap(), web);
        assert_eq!(reopened.audit_log().unwrap().len(), 1);
    }

    #[test]
    fn ids_keep_increasing_after_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inventory.json");

        let first = {
            let store = JsonInventoryStore::open(&path).unwrap();
            let acc = store.add_account(new_account("main")).unwrap();
            store.create_server(new_server(acc.id, "a", "")).unwrap()
        };
        let store = JsonInventoryStore::open(&path).unwrap();
        let second = store.create_server(new_server(first.account_id, "b", "")).unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn missing_file_is_created_on_first_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("inventory.json");

        let store = JsonInventoryStore::open(&path).unwrap();
        assert!(!path.exists());
        store.add_account(new_account("main")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn create_writes_an_empty_inventory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inventory.json");

        JsonInventoryStore::create(&path).unwrap();
        assert!(path.exists());
        let reopened = JsonInventoryStore::open(&path).unwrap();
        assert!(reopened.list_accounts().unwrap().is_empty());
    }

    #[test]
    fn malformed_file_is_a_storage_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inventory.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonInventoryStore::open(&path).err().unwrap();
        assert!(matches!(err, InventoryError::Storage { .. }));
    }

    #[test]
    fn update_of_missing_server_is_not_found() {
        let store = JsonInventoryStore::in_memory();
        let acc = store.add_account(new_account("main")).unwrap();
        let mut web = store.create_server(new_server(acc.id, "web1", "")).unwrap();
        web.id = 999;

        let err = store.update_server(&web).unwrap_err();
        assert!(matches!(err, InventoryError::NotFound { .. }));
    }

    #[test]
    fn update_keeps_created_at() {
        let store = JsonInventoryStore::in_memory();
        let acc = store.add_account(new_account("main")).unwrap();
        let web = store.create_server(new_server(acc.id, "web1", "")).unwrap();

        let mut changed = web.clone();
        changed.created_at = Utc::now() + chrono::Duration::days(1);
        changed.name = "web2".into();
        let saved = store.update_server(&changed).unwrap();

        assert_eq!(saved.created_at, web.created_at);
        assert_eq!(saved.name, "web2");
    }

    #[test]
    fn lookups_are_scoped_to_account() {
        let store = JsonInventoryStore::in_memory();
        let a = store.add_account(new_account("a")).unwrap();
        let b = store.add_account(new_account("b")).unwrap();
        store.create_server(new_server(a.id, "web1", "1.2.3.4")).unwrap();
        store.create_server(new_server(b.id, "web1", "1.2.3.4")).unwrap();

        assert_eq!(store.find_servers_by_ip(a.id, "1.2.3.4").unwrap().len(), 1);
        assert_eq!(store.find_servers_by_name(b.id, "web1").unwrap().len(), 1);
        assert!(store.find_servers_by_name(a.id, "web2").unwrap().is_empty());
    }

    #[test]
    fn accounts_without_key_are_not_listed_for_sync() {
        let store = JsonInventoryStore::in_memory();
        store.add_account(new_account("with-key")).unwrap();
        store
            .add_account(NewAccount {
                api_key: String::new(),
                ..new_account("without-key")
            })
            .unwrap();

        let syncable = store.list_accounts_with_credentials().unwrap();
        assert_eq!(syncable.len(), 1);
        assert_eq!(syncable[0].name, "with-key");
    }

    #[test]
    fn duplicate_account_name_is_rejected() {
        let store = JsonInventoryStore::in_memory();
        store.add_account(new_account("main")).unwrap();
        assert!(store.add_account(new_account("main")).is_err());
        assert!(store.add_account(new_account("  ")).is_err());
    }

    #[test]
    fn list_servers_applies_filters() {
        let store = JsonInventoryStore::in_memory();
        let acc = store.add_account(new_account("main")).unwrap();
        store.create_server(new_server(acc.id, "a", "")).unwrap();
        store
            .create_server(NewServer {
                status: ServerStatus::Paused,
                ..new_server(acc.id, "b", "")
            })
            .unwrap();

        let paused = store
            .list_servers(ServerFilter {
                status: Some(ServerStatus::Paused),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(paused.len(), 1);
        assert_eq!(paused[0].name, "b");

        let other = store
            .list_servers(ServerFilter {
                account_id: Some(acc.id + 1),
                ..Default::default()
            })
            .unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn audit_query_filters_and_keeps_newest() {
        let store = JsonInventoryStore::in_memory();
        for (server_id, action) in [
            (1, LogAction::Added),
            (1, LogAction::Synced),
            (2, LogAction::Added),
            (1, LogAction::Deleted),
        ] {
            store
                .append_audit_log(NewAuditEntry {
                    server_id,
                    action,
                    description: format!("{action}"),
                })
                .unwrap();
        }

        let for_one = store
            .query_audit_log(AuditQuery {
                server_id: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(for_one.len(), 3);

        let added = store
            .query_audit_log(AuditQuery {
                action: Some(LogAction::Added),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(added.len(), 2);

        let last_two = store
            .query_audit_log(AuditQuery {
                last: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[1].action, LogAction::Deleted);
    }

    #[test]
    fn unchanged_update_skips_the_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inventory.json");
        let store = JsonInventoryStore::open(&path).unwrap();
        let acc = store.add_account(new_account("main")).unwrap();
        let web = store.create_server(new_server(acc.id, "web1", "1.2.3.4")).unwrap();
        fs::remove_file(&path).unwrap();

        let saved = store.update_server(&web).unwrap();

        assert_eq!(saved.updated_at, web.updated_at);
        assert!(!path.exists());
    }

    #[test]
    fn set_status_logs_matching_action() {
        let store = JsonInventoryStore::in_memory();
        let acc = store.add_account(new_account("main")).unwrap();
        let web = store.create_server(new_server(acc.id, "web1", "")).unwrap();

        for (status, action) in [
            (ServerStatus::Paused, LogAction::Paused),
            (ServerStatus::Deleted, LogAction::Deleted),
            (ServerStatus::Active, LogAction::Updated),
        ] {
            let saved = store.set_server_status(web.id, status).unwrap();
            assert_eq!(saved.status, status);
            let last = store.audit_log().unwrap().pop().unwrap();
            assert_eq!(last.server_id, web.id);
            assert_eq!(last.action, action);
            assert_eq!(last.description, format!("Status changed to {status}"));
        }
    }

    #[test]
    fn set_status_of_missing_server_writes_nothing() {
        let store = JsonInventoryStore::in_memory();
        let err = store.set_server_status(7, ServerStatus::Paused).unwrap_err();
        assert!(matches!(err, InventoryError::NotFound { .. }));
        assert!(store.audit_log().unwrap().is_empty());
    }

    #[test]
    fn edit_changes_only_given_fields() {
        let store = JsonInventoryStore::in_memory();
        let acc = store.add_account(new_account("main")).unwrap();
        let web = store.create_server(new_server(acc.id, "web1", "1.2.3.4")).unwrap();

        let saved = store
            .edit_server(
                web.id,
                ServerEdit {
                    responsible: Some("alice".into()),
                    approximate_cost: Some(7.5),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(saved.responsible, "alice");
        assert_eq!(saved.approximate_cost, 7.5);
        assert_eq!(saved.name, "web1");
        assert_eq!(saved.ip, "1.2.3.4");
        let log = store.audit_log().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, LogAction::Updated);
        assert_eq!(log[0].description, "Server updated");
    }

    #[test]
    fn invalid_edits_are_rejected() {
        let store = JsonInventoryStore::in_memory();
        let acc = store.add_account(new_account("main")).unwrap();
        let web = store.create_server(new_server(acc.id, "web1", "")).unwrap();

        for edit in [
            ServerEdit::default(),
            ServerEdit {
                name: Some("  ".into()),
                ..Default::default()
            },
            ServerEdit {
                approximate_cost: Some(-1.0),
                ..Default::default()
            },
        ] {
            let err = store.edit_server(web.id, edit).unwrap_err();
            assert!(matches!(err, InventoryError::InvalidInput { .. }));
        }
        assert_eq!(store.get_server(web.id).unwrap(), web);
        assert!(store.audit_log().unwrap().is_empty());
    }
}
