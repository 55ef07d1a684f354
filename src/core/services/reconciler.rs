use std::collections::HashSet;

use serde::Deserialize;

use crate::core::errors::Result;
use crate::core::models::account::{Account, ProviderKind};
use crate::core::models::audit_entry::{LogAction, NewAuditEntry};
use crate::core::models::server_record::{NewServer, ServerRecord, ServerStatus};
use crate::core::models::snapshot::RemoteServerSnapshot;
use crate::core::models::sync_report::AccountSyncStats;
use crate::core::services::diff_service::{DiffService, SyncedFields};
use crate::core::services::identity_resolver::IdentityResolver;
use crate::core::services::status_mapper::StatusMapper;
use crate::core::traits::inventory_store::InventoryStore;
use crate::core::traits::provider::ServerProvider;

/// Audit text for records retired by the sweep.
pub const SWEEP_MESSAGE: &str = "Server no longer found in provider inventory, marked as deleted";

/// What to do with a matched record whose update failed mid-pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFailurePolicy {
    /// Treat the record as seen so the sweep leaves it alone. A failed
    /// lookup also suspends the sweep for that pass.
    #[default]
    Retain,
    /// Leave it unseen; the sweep retires it in the same pass.
    Sweep,
}

/// Reconciles one account's local records against its provider inventory.
pub struct Reconciler<'a, S: InventoryStore + ?Sized> {
    store: &'a S,
    policy: WriteFailurePolicy,
}

/// Mutable state threaded through one pass.
#[derive(Default)]
struct Pass {
    seen: HashSet<u64>,
    stats: AccountSyncStats,
    lookup_failed: bool,
}

impl<'a, S: InventoryStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S, policy: WriteFailurePolicy) -> Self {
        Self { store, policy }
    }

    /// Run a full pass for `account`: fetch, create/update, then sweep.
    ///
    /// A fetch failure is returned before anything is written. Failures on
    /// individual records are logged and counted in `failed`.
    pub fn reconcile(
        &self,
        account: &Account,
        provider: &dyn ServerProvider,
    ) -> Result<AccountSyncStats> {
        let kind = provider.kind();
        tracing::info!(
            account_id = account.id,
            account = %account.name,
            provider = %kind,
            "syncing account"
        );

        let snapshots = provider.list_servers(&account.credentials())?;
        tracing::debug!(account_id = account.id, count = snapshots.len(), "fetched inventory");

        let mut pass = Pass::default();
        for snapshot in &snapshots {
            self.apply_snapshot(account, kind, snapshot, &mut pass);
        }

        if pass.lookup_failed && self.policy == WriteFailurePolicy::Retain {
            tracing::warn!(
                account_id = account.id,
                "skipping deletion sweep: some servers could not be matched this pass"
            );
        } else {
            self.sweep(account.id, &mut pass);
        }

        let stats = pass.stats;
        tracing::info!(
            account_id = account.id,
            created = stats.created,
            updated = stats.updated,
            unchanged = stats.unchanged,
            deleted = stats.deleted,
            failed = stats.failed,
            "account synced"
        );
        Ok(stats)
    }

    fn apply_snapshot(
        &self,
        account: &Account,
        kind: ProviderKind,
        snapshot: &RemoteServerSnapshot,
        pass: &mut Pass,
    ) {
        let status = StatusMapper::map(kind, &snapshot.native_status, snapshot.cancelled);

        // Records already matched this pass are off the table for later snapshots.
        let resolved = IdentityResolver.resolve(self.store, account.id, snapshot, &pass.seen);
        let existing = match resolved {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(name = %snapshot.name, error = %e, "lookup failed, skipping server");
                pass.stats.failed += 1;
                pass.lookup_failed = true;
                return;
            }
        };

        match existing {
            Some(record) => self.update_existing(record, snapshot, status, pass),
            None => self.create_new(account.id, kind, snapshot, status, pass),
        }
    }

    fn create_new(
        &self,
        account_id: u64,
        kind: ProviderKind,
        snapshot: &RemoteServerSnapshot,
        status: ServerStatus,
        pass: &mut Pass,
    ) {
        let server = NewServer {
            account_id,
            name: snapshot.name.clone(),
            ip: snapshot.ip_or_empty().to_string(),
            location: snapshot.location.clone(),
            description: snapshot.description.clone(),
            responsible: String::new(),
            approximate_cost: snapshot.monthly_cost.unwrap_or(0.0),
            backups_enabled: snapshot.has_backups.unwrap_or(false),
            status,
        };

        match self.store.create_server(server) {
            Ok(created) => {
                pass.seen.insert(created.id);
                pass.stats.created += 1;
                tracing::debug!(server_id = created.id, name = %created.name, "created server");
                self.audit(
                    created.id,
                    LogAction::Added,
                    format!("Added from {} sync", kind.display_name()),
                );
            }
            Err(e) => {
                tracing::warn!(name = %snapshot.name, error = %e, "failed to create server, skipping");
                pass.stats.failed += 1;
            }
        }
    }

    fn update_existing(
        &self,
        record: ServerRecord,
        snapshot: &RemoteServerSnapshot,
        status: ServerStatus,
        pass: &mut Pass,
    ) {
        // Providers without pricing keep whatever cost/backups the record has.
        let incoming = SyncedFields {
            name: snapshot.name.clone(),
            ip: snapshot.ip_or_empty().to_string(),
            location: snapshot.location.clone(),
            description: snapshot.description.clone(),
            status,
            approximate_cost: snapshot.monthly_cost.unwrap_or(record.approximate_cost),
            backups_enabled: snapshot.has_backups.unwrap_or(record.backups_enabled),
        };

        let diff = DiffService.diff(&record, &incoming);

        let mut updated = record;
        incoming.apply_to(&mut updated);

        match self.store.update_server(&updated) {
            Ok(saved) => {
                pass.seen.insert(saved.id);
                if diff.is_empty() {
                    pass.stats.unchanged += 1;
                } else {
                    pass.stats.updated += 1;
                    tracing::debug!(server_id = saved.id, changes = %diff, "updated server");
                    self.audit(saved.id, LogAction::Synced, diff);
                }
            }
            Err(e) => {
                tracing::warn!(
                    server_id = updated.id,
                    name = %updated.name,
                    error = %e,
                    "failed to update server, skipping"
                );
                pass.stats.failed += 1;
                if self.policy == WriteFailurePolicy::Retain {
                    pass.seen.insert(updated.id);
                }
            }
        }
    }

    /// Retire every live record of the account that this pass did not see.
    fn sweep(&self, account_id: u64, pass: &mut Pass) {
        let records = match self.store.list_servers_by_account(account_id) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(account_id, error = %e, "failed to list servers for sweep");
                return;
            }
        };

        let unseen = records
            .into_iter()
            .filter(|r| r.status != ServerStatus::Deleted && !pass.seen.contains(&r.id));

        for mut record in unseen {
            record.status = ServerStatus::Deleted;
            if let Err(e) = self.store.update_server(&record) {
                tracing::warn!(server_id = record.id, error = %e, "failed to mark server as deleted");
                continue;
            }
            pass.stats.deleted += 1;
            tracing::info!(
                server_id = record.id,
                name = %record.name,
                ip = %record.ip,
                "marked server as deleted, not found at provider"
            );
            self.audit(record.id, LogAction::Deleted, SWEEP_MESSAGE.to_string());
        }
    }

    /// Append an audit entry. Warns on failure instead of propagating,
    /// since the record write already happened.
    fn audit(&self, server_id: u64, action: LogAction, description: String) {
        let entry = NewAuditEntry {
            server_id,
            action,
            description,
        };
        if let Err(e) = self.store.append_audit_log(entry) {
            tracing::warn!(server_id, %action, error = %e, "could not write audit log");
        }
    }
}
