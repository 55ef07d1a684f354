use std::collections::HashMap;

use crate::core::errors::Result;
use crate::core::models::account::ProviderKind;
use crate::core::models::sync_report::{AccountOutcome, AccountSyncError, SyncReport};
use crate::core::services::reconciler::{Reconciler, WriteFailurePolicy};
use crate::core::traits::inventory_store::InventoryStore;
use crate::core::traits::provider::ServerProvider;

/// Adapters available for this run, keyed by provider kind.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Box<dyn ServerProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own kind, replacing any previous one.
    pub fn register(&mut self, provider: Box<dyn ServerProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&dyn ServerProvider> {
        self.providers.get(&kind).map(|p| p.as_ref())
    }

    pub fn kinds(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.providers.keys().copied().collect();
        kinds.sort_by_key(|k| k.ident());
        kinds
    }
}

/// Runs a reconciliation pass for every account that has credentials.
///
/// Accounts are processed one after another. A failing account is recorded
/// in the report and the run moves on.
pub struct SyncCoordinator<'a, S: InventoryStore + ?Sized> {
    store: &'a S,
    registry: &'a ProviderRegistry,
    policy: WriteFailurePolicy,
}

impl<'a, S: InventoryStore + ?Sized> SyncCoordinator<'a, S> {
    pub fn new(store: &'a S, registry: &'a ProviderRegistry, policy: WriteFailurePolicy) -> Self {
        Self {
            store,
            registry,
            policy,
        }
    }

    /// Sync all accounts. Only a failure to list accounts is returned as an error.
    pub fn run(&self) -> Result<SyncReport> {
        let accounts = self.store.list_accounts_with_credentials()?;
        let reconciler = Reconciler::new(self.store, self.policy);
        let mut report = SyncReport::default();

        for account in accounts {
            let Some(provider) = self.registry.get(account.provider) else {
                tracing::debug!(
                    account_id = account.id,
                    provider = %account.provider,
                    "no adapter for provider, skipping account"
                );
                report.accounts_skipped += 1;
                continue;
            };

            match reconciler.reconcile(&account, provider) {
                Ok(stats) => report.record_success(AccountOutcome {
                    account_id: account.id,
                    account_name: account.name,
                    provider: account.provider,
                    stats,
                }),
                Err(error) => {
                    tracing::error!(
                        account_id = account.id,
                        account = %account.name,
                        provider = %account.provider,
                        kind = error.kind(),
                        error = %error,
                        "account sync failed"
                    );
                    report.errors.push(AccountSyncError {
                        account_id: account.id,
                        account_name: account.name,
                        provider: account.provider,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            processed = report.accounts_processed,
            skipped = report.accounts_skipped,
            failed = report.errors.len(),
            servers = report.servers_synced,
            "sync finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::json_store::JsonInventoryStore;
    use crate::core::models::account::NewAccount;
    use crate::core::models::server_record::ServerStatus;
    use crate::core::services::test_support::{seed_account, seed_server, snapshot, StaticProvider};

    fn registry(providers: Vec<StaticProvider>) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for p in providers {
            registry.register(Box::new(p));
        }
        registry
    }

    #[test]
    fn failing_account_does_not_stop_the_run() {
        let store = JsonInventoryStore::in_memory();
        let cloud = seed_account(&store, ProviderKind::HetznerCloud, "cloud");
        let robot = seed_account(&store, ProviderKind::HetznerRobot, "robot");
        let untouched = seed_server(&store, robot, "box1", "5.5.5.5", ServerStatus::Active);

        let registry = registry(vec![
            StaticProvider::returning(
                ProviderKind::HetznerCloud,
                vec![
                    snapshot("web1", Some("1.1.1.1"), "running"),
                    snapshot("web2", Some("2.2.2.2"), "running"),
                ],
            ),
            StaticProvider::failing(ProviderKind::HetznerRobot, "timed out"),
        ]);

        let report = SyncCoordinator::new(&store, &registry, WriteFailurePolicy::Retain)
            .run()
            .unwrap();

        assert_eq!(report.accounts_processed, 1);
        assert_eq!(report.servers_synced, 2);
        assert_eq!(report.accounts[0].account_id, cloud);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].account_id, robot);
        assert!(report.errors[0].error.is_provider_failure());

        assert_eq!(store.list_servers_by_account(cloud).unwrap().len(), 2);
        assert_eq!(store.get_server(untouched.id).unwrap(), untouched);
    }

    #[test]
    fn account_without_adapter_is_skipped() {
        let store = JsonInventoryStore::in_memory();
        seed_account(&store, ProviderKind::Scaleway, "scw");
        seed_account(&store, ProviderKind::HetznerCloud, "cloud");
        let registry = registry(vec![StaticProvider::returning(
            ProviderKind::HetznerCloud,
            vec![],
        )]);

        let report = SyncCoordinator::new(&store, &registry, WriteFailurePolicy::Retain)
            .run()
            .unwrap();

        assert_eq!(report.accounts_skipped, 1);
        assert_eq!(report.accounts_processed, 1);
        assert!(!report.has_errors());
    }

    #[test]
    fn accounts_without_credentials_are_not_synced() {
        let store = JsonInventoryStore::in_memory();
        store
            .add_account(NewAccount {
                provider: ProviderKind::HetznerCloud,
                name: "empty".into(),
                login: None,
                api_key: "   ".into(),
            })
            .unwrap();
        let provider = StaticProvider::returning(ProviderKind::HetznerCloud, vec![]);
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(provider));

        let report = SyncCoordinator::new(&store, &registry, WriteFailurePolicy::Retain)
            .run()
            .unwrap();

        assert_eq!(report.accounts_processed, 0);
        assert_eq!(report.accounts_skipped, 0);
    }

    #[test]
    fn each_account_fetches_once() {
        let store = JsonInventoryStore::in_memory();
        seed_account(&store, ProviderKind::HetznerCloud, "a");
        seed_account(&store, ProviderKind::HetznerCloud, "b");
        let provider = std::sync::Arc::new(StaticProvider::returning(
            ProviderKind::HetznerCloud,
            vec![snapshot("web1", Some("1.1.1.1"), "running")],
        ));

        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(SharedProvider(provider.clone())));
        SyncCoordinator::new(&store, &registry, WriteFailurePolicy::Retain)
            .run()
            .unwrap();

        assert_eq!(provider.calls(), 2);
    }

    struct SharedProvider(std::sync::Arc<StaticProvider>);

    impl ServerProvider for SharedProvider {
        fn kind(&self) -> ProviderKind {
            self.0.kind()
        }

        fn list_servers(
            &self,
            credentials: &crate::core::models::account::Credentials,
        ) -> Result<Vec<crate::core::models::snapshot::RemoteServerSnapshot>> {
            self.0.list_servers(credentials)
        }
    }

    #[test]
    fn registry_reports_registered_kinds() {
        let registry = registry(vec![
            StaticProvider::returning(ProviderKind::HetznerRobot, vec![]),
            StaticProvider::returning(ProviderKind::HetznerCloud, vec![]),
        ]);
        assert_eq!(
            registry.kinds(),
            vec![ProviderKind::HetznerCloud, ProviderKind::HetznerRobot]
        );
        assert!(registry.get(ProviderKind::Aws).is_none());
    }
}
