//! Common test utilities: service harness, failing repositories and output helpers

#![allow(dead_code)]

use async_trait::async_trait;
use live_settings::config::{Config, ScopeOverrideConfig};
use live_settings::contract::{ScopeId, SettingRow, StorageTable, StoreError};
use live_settings::domain::{FixedScopeResolver, Registry, Service, SettingsRepository};
use live_settings::infra::cache::InMemorySettingsCache;
use live_settings::infra::storage::InMemorySettingsRepository;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::oneshot;

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}

/// Service over an in-memory repository, scope 1, cache enabled
pub struct TestEnv {
    pub registry: Arc<Registry>,
    pub repo: Arc<InMemorySettingsRepository>,
    pub service: Arc<Service>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_scope(config, 1)
    }

    pub fn with_scope(config: Config, scope: i64) -> Self {
        let registry = Registry::new();
        let repo = Arc::new(InMemorySettingsRepository::new());
        let service = Arc::new(Service::new(
            registry.clone(),
            repo.clone(),
            Arc::new(InMemorySettingsCache::new(None, 1000)),
            Arc::new(FixedScopeResolver::new(scope)),
            &config,
        ));
        Self {
            registry,
            repo,
            service,
        }
    }

    /// Print verbose information about repository state
    pub async fn print_state(&self, context: &str) {
        println!("\n========== Repository State: {} ==========", context);
        for table in StorageTable::PERSISTENT {
            let rows = self.repo.list_all(table).await.unwrap();
            println!("  {} ({} rows)", table.as_str(), rows.len());
            for row in rows {
                println!("    [{}] {}", row.scope, row);
            }
        }
        println!("====================================================\n");
    }

    /// Stored string for `(scope 1, group, key)` in a table
    pub async fn stored(&self, table: StorageTable, group: &str, key: &str) -> Option<String> {
        self.repo
            .find(table, ScopeId(1), group, key)
            .await
            .unwrap()
            .map(|row| row.value)
    }
}

/// Override entry for one scope
pub fn override_entry(scope: i64, db: bool, entries: &[(&str, &str, &str)]) -> ScopeOverrideConfig {
    let mut settings: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for (group, key, value) in entries {
        settings
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }
    ScopeOverrideConfig {
        scope,
        db,
        settings,
    }
}

// Mock repository implementations for testing
pub mod mocks {
    use super::*;

    /// Repository whose tables do not exist yet until `migrate` is called
    pub struct UnmigratedRepo {
        migrated: RwLock<bool>,
        inner: InMemorySettingsRepository,
    }

    impl UnmigratedRepo {
        pub fn new() -> Self {
            Self {
                migrated: RwLock::new(false),
                inner: InMemorySettingsRepository::new(),
            }
        }

        pub fn migrate(&self) {
            *self.migrated.write() = true;
        }

        fn check(&self, table: StorageTable) -> Result<(), StoreError> {
            if *self.migrated.read() {
                Ok(())
            } else {
                Err(StoreError::SchemaMissing {
                    table: table.as_str().to_string(),
                })
            }
        }
    }

    #[async_trait]
    impl SettingsRepository for UnmigratedRepo {
        async fn find(
            &self,
            table: StorageTable,
            scope: ScopeId,
            group: &str,
            key: &str,
        ) -> Result<Option<SettingRow>, StoreError> {
            self.check(table)?;
            self.inner.find(table, scope, group, key).await
        }

        async fn upsert(&self, row: &SettingRow) -> Result<(), StoreError> {
            self.check(row.table)?;
            self.inner.upsert(row).await
        }

        async fn delete(
            &self,
            table: StorageTable,
            scope: ScopeId,
            group: &str,
            key: &str,
        ) -> Result<bool, StoreError> {
            self.check(table)?;
            self.inner.delete(table, scope, group, key).await
        }

        async fn list_all(&self, table: StorageTable) -> Result<Vec<SettingRow>, StoreError> {
            self.check(table)?;
            self.inner.list_all(table).await
        }
    }

    /// Repository that reads fine but rejects every write
    pub struct ReadOnlyRepo;

    #[async_trait]
    impl SettingsRepository for ReadOnlyRepo {
        async fn find(
            &self,
            _table: StorageTable,
            _scope: ScopeId,
            _group: &str,
            _key: &str,
        ) -> Result<Option<SettingRow>, StoreError> {
            Ok(None)
        }

        async fn upsert(&self, _row: &SettingRow) -> Result<(), StoreError> {
            Err(StoreError::Backend(anyhow::anyhow!("disk full")))
        }

        async fn delete(
            &self,
            _table: StorageTable,
            _scope: ScopeId,
            _group: &str,
            _key: &str,
        ) -> Result<bool, StoreError> {
            Err(StoreError::Backend(anyhow::anyhow!("disk full")))
        }

        async fn list_all(&self, _table: StorageTable) -> Result<Vec<SettingRow>, StoreError> {
            Ok(Vec::new())
        }
    }

    type Gate = (oneshot::Sender<()>, oneshot::Receiver<()>);

    /// In-memory repository that can hold one `find` after it has read its row
    pub struct GatedRepo {
        inner: InMemorySettingsRepository,
        gate: Mutex<Option<Gate>>,
    }

    impl GatedRepo {
        pub fn new() -> Self {
            Self {
                inner: InMemorySettingsRepository::new(),
                gate: Mutex::new(None),
            }
        }

        /// Hold the next `find`. Returns a receiver that fires once it is held and the
        /// sender that lets it return.
        pub fn arm(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
            let (held_tx, held_rx) = oneshot::channel();
            let (release_tx, release_rx) = oneshot::channel();
            *self.gate.lock() = Some((held_tx, release_rx));
            (held_rx, release_tx)
        }
    }

    #[async_trait]
    impl SettingsRepository for GatedRepo {
        async fn find(
            &self,
            table: StorageTable,
            scope: ScopeId,
            group: &str,
            key: &str,
        ) -> Result<Option<SettingRow>, StoreError> {
            let found = self.inner.find(table, scope, group, key).await;
            let gate = self.gate.lock().take();
            if let Some((held, release)) = gate {
                let _ = held.send(());
                let _ = release.await;
            }
            found
        }

        async fn upsert(&self, row: &SettingRow) -> Result<(), StoreError> {
            self.inner.upsert(row).await
        }

        async fn delete(
            &self,
            table: StorageTable,
            scope: ScopeId,
            group: &str,
            key: &str,
        ) -> Result<bool, StoreError> {
            self.inner.delete(table, scope, group, key).await
        }

        async fn list_all(&self, table: StorageTable) -> Result<Vec<SettingRow>, StoreError> {
            self.inner.list_all(table).await
        }
    }
}
