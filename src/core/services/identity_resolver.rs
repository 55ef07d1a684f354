use std::collections::HashSet;

use crate::core::errors::Result;
use crate::core::models::server_record::{ServerRecord, ServerStatus};
use crate::core::models::snapshot::RemoteServerSnapshot;
use crate::core::traits::inventory_store::InventoryStore;

/// Finds the local record a remote snapshot corresponds to.
///
/// Matching is exact and never leaves the account:
/// 1. by IP, when the snapshot has one and it identifies a single record
/// 2. by name otherwise
///
/// Records in `claimed` already belong to another snapshot of the same pass
/// and are never handed out twice.
pub struct IdentityResolver;

impl IdentityResolver {
    pub fn resolve<S: InventoryStore + ?Sized>(
        &self,
        store: &S,
        account_id: u64,
        snapshot: &RemoteServerSnapshot,
        claimed: &HashSet<u64>,
    ) -> Result<Option<ServerRecord>> {
        let unclaimed = |records: Vec<ServerRecord>| -> Vec<ServerRecord> {
            records
                .into_iter()
                .filter(|s| !claimed.contains(&s.id))
                .collect()
        };

        let ip = snapshot.ip_or_empty();
        if !ip.is_empty() {
            let candidates = unclaimed(store.find_servers_by_ip(account_id, ip)?);
            let count = candidates.len();
            match pick_unique(candidates) {
                Some(found) => return Ok(Some(found)),
                None if count > 1 => {
                    tracing::debug!(account_id, ip, count, "ambiguous IP match, trying name");
                }
                None => {}
            }
        }

        if snapshot.name.is_empty() {
            return Ok(None);
        }

        let candidates = unclaimed(store.find_servers_by_name(account_id, &snapshot.name)?);
        if candidates.len() > 1 {
            tracing::debug!(
                account_id,
                name = %snapshot.name,
                count = candidates.len(),
                "several records share this name"
            );
        }
        Ok(pick_unique(candidates.clone()).or_else(|| lowest_id_live(candidates)))
    }
}

/// A single candidate, or the single non-deleted one among several.
fn pick_unique(mut candidates: Vec<ServerRecord>) -> Option<ServerRecord> {
    if candidates.len() == 1 {
        return candidates.pop();
    }
    let mut live: Vec<ServerRecord> = candidates
        .into_iter()
        .filter(|s| s.status != ServerStatus::Deleted)
        .collect();
    if live.len() == 1 { live.pop() } else { None }
}

/// Deterministic tie-break so repeated runs keep resolving to the same record.
fn lowest_id_live(candidates: Vec<ServerRecord>) -> Option<ServerRecord> {
    let fallback = candidates.iter().min_by_key(|s| s.id).cloned();
    candidates
        .into_iter()
        .filter(|s| s.status != ServerStatus::Deleted)
        .min_by_key(|s| s.id)
        .or(fallback)
}
