//! In-process repository, used when no database is configured

use crate::contract::{ScopeId, SettingRow, StorageTable, StoreError};
use crate::domain::repository::SettingsRepository;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

type RowKey = (ScopeId, String, String);

/// Two ordered maps standing in for the bounded and unbounded tables
#[derive(Default)]
pub struct InMemorySettingsRepository {
    bounded: RwLock<BTreeMap<RowKey, String>>,
    unbounded: RwLock<BTreeMap<RowKey, String>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows held in a table
    pub fn count(&self, table: StorageTable) -> usize {
        match self.rows(table) {
            Some(rows) => rows.read().len(),
            None => 0,
        }
    }

    fn rows(&self, table: StorageTable) -> Option<&RwLock<BTreeMap<RowKey, String>>> {
        match table {
            StorageTable::Bounded => Some(&self.bounded),
            StorageTable::Unbounded => Some(&self.unbounded),
            StorageTable::Override => None,
        }
    }

    fn writable(&self, table: StorageTable) -> Result<&RwLock<BTreeMap<RowKey, String>>, StoreError> {
        self.rows(table).ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!(
                "{} rows are read-only and not stored",
                table.as_str()
            ))
        })
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn find(
        &self,
        table: StorageTable,
        scope: ScopeId,
        group: &str,
        key: &str,
    ) -> Result<Option<SettingRow>, StoreError> {
        let Some(rows) = self.rows(table) else {
            return Ok(None);
        };
        let found = rows
            .read()
            .get(&(scope, group.to_owned(), key.to_owned()))
            .map(|value| SettingRow::new(scope, group, key, value.clone(), table));
        Ok(found)
    }

    async fn upsert(&self, row: &SettingRow) -> Result<(), StoreError> {
        self.writable(row.table)?.write().insert(
            (row.scope, row.group.clone(), row.key.clone()),
            row.value.clone(),
        );
        Ok(())
    }

    async fn delete(
        &self,
        table: StorageTable,
        scope: ScopeId,
        group: &str,
        key: &str,
    ) -> Result<bool, StoreError> {
        let removed = self
            .writable(table)?
            .write()
            .remove(&(scope, group.to_owned(), key.to_owned()));
        Ok(removed.is_some())
    }

    async fn list_all(&self, table: StorageTable) -> Result<Vec<SettingRow>, StoreError> {
        let Some(rows) = self.rows(table) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .read()
            .iter()
            .map(|((scope, group, key), value)| {
                SettingRow::new(*scope, group.as_str(), key.as_str(), value.clone(), table)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_find_delete() {
        let repo = InMemorySettingsRepository::new();
        let row = SettingRow::new(ScopeId(1), "SHOP", "NAME", "Acme", StorageTable::Bounded);
        repo.upsert(&row).await.unwrap();

        let found = repo
            .find(StorageTable::Bounded, ScopeId(1), "SHOP", "NAME")
            .await
            .unwrap();
        assert_eq!(found, Some(row));

        // Tables are independent
        let other = repo
            .find(StorageTable::Unbounded, ScopeId(1), "SHOP", "NAME")
            .await
            .unwrap();
        assert!(other.is_none());

        assert!(repo
            .delete(StorageTable::Bounded, ScopeId(1), "SHOP", "NAME")
            .await
            .unwrap());
        assert!(!repo
            .delete(StorageTable::Bounded, ScopeId(1), "SHOP", "NAME")
            .await
            .unwrap());
        assert_eq!(repo.count(StorageTable::Bounded), 0);
    }

    #[tokio::test]
    async fn test_override_table_is_read_only() {
        let repo = InMemorySettingsRepository::new();
        let row = SettingRow::new(ScopeId(1), "SHOP", "NAME", "Acme", StorageTable::Override);
        assert!(repo.upsert(&row).await.is_err());
        assert!(repo.list_all(StorageTable::Override).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_all_is_ordered() {
        let repo = InMemorySettingsRepository::new();
        for (scope, key) in [(2, "B"), (1, "B"), (1, "A")] {
            let row = SettingRow::new(ScopeId(scope), "G", key, "v", StorageTable::Unbounded);
            repo.upsert(&row).await.unwrap();
        }

        let ids: Vec<String> = repo
            .list_all(StorageTable::Unbounded)
            .await
            .unwrap()
            .into_iter()
            .map(|row| format!("{}:{}", row.scope, row.key))
            .collect();
        assert_eq!(ids, vec!["1:A", "1:B", "2:B"]);
    }
}
