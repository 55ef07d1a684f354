use crate::core::errors::InventoryError;
use crate::core::models::account::ProviderKind;

/// Counters for one account's reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountSyncStats {
    /// Remote servers with no local match, created this pass.
    pub created: usize,
    /// Matched servers whose update produced a non-empty diff.
    pub updated: usize,
    /// Matched servers with nothing to report.
    pub unchanged: usize,
    /// Local servers retired by the sweep.
    pub deleted: usize,
    /// Snapshots skipped because a create or update failed.
    pub failed: usize,
}

impl AccountSyncStats {
    /// Snapshots that were successfully written (created or updated).
    pub fn synced(&self) -> usize {
        self.created + self.updated + self.unchanged
    }
}

/// Outcome of one account inside a sync run.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountOutcome {
    pub account_id: u64,
    pub account_name: String,
    pub provider: ProviderKind,
    pub stats: AccountSyncStats,
}

/// An account whose pass was aborted (provider fetch failed).
#[derive(Debug)]
pub struct AccountSyncError {
    pub account_id: u64,
    pub account_name: String,
    pub provider: ProviderKind,
    pub error: InventoryError,
}

/// Aggregate result of a whole sync run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Accounts whose pass completed.
    pub accounts_processed: usize,
    /// Accounts with no adapter for their provider kind.
    pub accounts_skipped: usize,
    pub servers_synced: usize,
    pub accounts: Vec<AccountOutcome>,
    pub errors: Vec<AccountSyncError>,
}

impl SyncReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn record_success(&mut self, outcome: AccountOutcome) {
        self.accounts_processed += 1;
        self.servers_synced += outcome.stats.synced();
        self.accounts.push(outcome);
    }
}
