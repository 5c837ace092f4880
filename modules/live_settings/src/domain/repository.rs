//! Repository and cache traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage and infra/cache.

use crate::contract::{ScopeId, SettingRow, StorageTable, StoreError};
use async_trait::async_trait;

/// Row store with a uniqueness constraint on (scope, group, key) per table
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Find a row by its composite key
    async fn find(
        &self,
        table: StorageTable,
        scope: ScopeId,
        group: &str,
        key: &str,
    ) -> Result<Option<SettingRow>, StoreError>;

    /// Insert or replace the row in `row.table`
    async fn upsert(&self, row: &SettingRow) -> Result<(), StoreError>;

    /// Delete a row; returns whether one existed
    async fn delete(
        &self,
        table: StorageTable,
        scope: ScopeId,
        group: &str,
        key: &str,
    ) -> Result<bool, StoreError>;

    /// Every row of a table, across all scopes
    async fn list_all(&self, table: StorageTable) -> Result<Vec<SettingRow>, StoreError>;
}

/// Read cache in front of the repository.
///
/// `get` returns `Some(None)` for a cached miss, so absent rows are not re-queried.
#[async_trait]
pub trait SettingsCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Option<SettingRow>>;

    async fn set(&self, key: &str, row: Option<SettingRow>);

    async fn delete(&self, key: &str);

    async fn clear(&self);
}

/// Cache key shared by both tables: `Setting::{scope}::{group}::{key}`
pub fn cache_key(scope: ScopeId, group: &str, key: &str) -> String {
    format!("Setting::{}::{}::{}", scope, group, key)
}
