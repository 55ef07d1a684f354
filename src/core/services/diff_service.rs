use crate::core::models::server_record::{ServerRecord, ServerStatus};

/// Cost differences below this are treated as float jitter, not a change.
pub const COST_NOISE_THRESHOLD: f64 = 0.01;

/// Separator between change fragments in a diff line.
pub const CHANGE_SEPARATOR: &str = ", ";

/// The sync-owned fields of a server, as they should look after sync.
///
/// `responsible` is deliberately absent: sync never writes it.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncedFields {
    pub name: String,
    pub ip: String,
    pub location: String,
    pub description: String,
    pub status: ServerStatus,
    pub approximate_cost: f64,
    pub backups_enabled: bool,
}

impl SyncedFields {
    /// Overwrite the sync-owned fields of `record`.
    pub fn apply_to(&self, record: &mut ServerRecord) {
        record.name.clone_from(&self.name);
        record.ip.clone_from(&self.ip);
        record.location.clone_from(&self.location);
        record.description.clone_from(&self.description);
        record.status = self.status;
        record.approximate_cost = self.approximate_cost;
        record.backups_enabled = self.backups_enabled;
    }
}

/// Compares a stored server against incoming sync fields and produces
/// a human-readable change summary.
pub struct DiffService;

impl DiffService {
    /// Describe what would change, one fragment per field, in a fixed order.
    ///
    /// - text fields report `Field: old → new`
    /// - cost is only reported when it moves by at least one cent
    /// - description changes are reported without echoing the text
    pub fn changes(&self, existing: &ServerRecord, incoming: &SyncedFields) -> Vec<String> {
        let mut changes = Vec::new();

        if existing.name != incoming.name {
            changes.push(format!("Name: {} → {}", existing.name, incoming.name));
        }
        if existing.ip != incoming.ip {
            changes.push(format!("IP: {} → {}", existing.ip, incoming.ip));
        }
        if existing.location != incoming.location {
            changes.push(format!(
                "Location: {} → {}",
                existing.location, incoming.location
            ));
        }
        if existing.status != incoming.status {
            changes.push(format!("Status: {} → {}", existing.status, incoming.status));
        }
        if cost_changed(existing.approximate_cost, incoming.approximate_cost) {
            changes.push(format!(
                "Cost: ${:.2} → ${:.2}",
                existing.approximate_cost, incoming.approximate_cost
            ));
        }
        if existing.backups_enabled != incoming.backups_enabled {
            changes.push(format!(
                "Backups: {} → {}",
                existing.backups_enabled, incoming.backups_enabled
            ));
        }
        if existing.description != incoming.description {
            changes.push("Description updated".to_string());
        }

        changes
    }

    /// Single-line diff text; empty when nothing observable changed.
    pub fn diff(&self, existing: &ServerRecord, incoming: &SyncedFields) -> String {
        self.changes(existing, incoming).join(CHANGE_SEPARATOR)
    }
}

fn cost_changed(old: f64, new: f64) -> bool {
    // The epsilon keeps a one-cent move (0.00999… in binary) reportable.
    (old - new).abs() >= COST_NOISE_THRESHOLD - 1e-9
}
