use crate::core::errors::Result;
use crate::core::models::account::Account;
use crate::core::models::audit_entry::{AuditLogEntry, NewAuditEntry};
use crate::core::models::server_record::{NewServer, ServerRecord};

/// Port for the persistence layer the reconciler writes through.
///
/// Implementations own their locking: reads take a shared lock, every
/// write takes an exclusive one. Each method is atomic on its own; two
/// sync runs may interleave between calls.
pub trait InventoryStore: Send + Sync {
    /// Accounts whose API key is non-empty.
    fn list_accounts_with_credentials(&self) -> Result<Vec<Account>>;

    /// All servers of `account_id` with exactly this IP, ordered by id.
    fn find_servers_by_ip(&self, account_id: u64, ip: &str) -> Result<Vec<ServerRecord>>;

    /// All servers of `account_id` with exactly this name, ordered by id.
    fn find_servers_by_name(&self, account_id: u64, name: &str) -> Result<Vec<ServerRecord>>;

    /// Every server owned by `account_id`, any status.
    fn list_servers_by_account(&self, account_id: u64) -> Result<Vec<ServerRecord>>;

    /// Persist a new server and return it with its assigned id.
    fn create_server(&self, server: NewServer) -> Result<ServerRecord>;

    /// Overwrite an existing server. Fails with `NotFound` if the id vanished.
    fn update_server(&self, server: &ServerRecord) -> Result<ServerRecord>;

    /// Append an entry to the audit log.
    fn append_audit_log(&self, entry: NewAuditEntry) -> Result<AuditLogEntry>;
}
