//! SeaORM repository implementations

use crate::contract::{ScopeId, SettingRow, StorageTable, StoreError};
use crate::domain::repository::SettingsRepository;
use async_trait::async_trait;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;

use super::entity;
use super::entity::long_setting;

// ===== Settings Repository =====

pub struct SeaOrmSettingsRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSettingsRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// Missing tables are reported separately so reads can fall back during startup
fn classify(table: StorageTable, err: DbErr) -> StoreError {
    let message = err.to_string().to_lowercase();
    let missing = message.contains("no such table")
        || message.contains("doesn't exist")
        || (message.contains("relation") && message.contains("does not exist"));
    if missing {
        StoreError::SchemaMissing {
            table: table.as_str().to_owned(),
        }
    } else {
        StoreError::Backend(
            anyhow::Error::new(err).context(format!("{} query failed", table.as_str())),
        )
    }
}

fn read_only(table: StorageTable) -> StoreError {
    StoreError::Backend(anyhow::anyhow!(
        "{} rows are read-only and not stored",
        table.as_str()
    ))
}

#[async_trait]
impl SettingsRepository for SeaOrmSettingsRepository {
    async fn find(
        &self,
        table: StorageTable,
        scope: ScopeId,
        group: &str,
        key: &str,
    ) -> Result<Option<SettingRow>, StoreError> {
        let id = (scope.0, group.to_owned(), key.to_owned());
        match table {
            StorageTable::Bounded => entity::Entity::find_by_id(id)
                .one(&*self.db)
                .await
                .map(|found| found.map(Into::into))
                .map_err(|e| classify(table, e)),
            StorageTable::Unbounded => long_setting::Entity::find_by_id(id)
                .one(&*self.db)
                .await
                .map(|found| found.map(Into::into))
                .map_err(|e| classify(table, e)),
            StorageTable::Override => Ok(None),
        }
    }

    async fn upsert(&self, row: &SettingRow) -> Result<(), StoreError> {
        match row.table {
            StorageTable::Bounded => {
                let active: entity::ActiveModel = row.into();
                entity::Entity::insert(active)
                    .on_conflict(
                        OnConflict::columns([
                            entity::Column::ScopeId,
                            entity::Column::GroupKey,
                            entity::Column::ValueKey,
                        ])
                        .update_columns([entity::Column::Value, entity::Column::UpdatedAt])
                        .to_owned(),
                    )
                    .exec_without_returning(&*self.db)
                    .await
                    .map_err(|e| classify(row.table, e))?;
            }
            StorageTable::Unbounded => {
                let active: long_setting::ActiveModel = row.into();
                long_setting::Entity::insert(active)
                    .on_conflict(
                        OnConflict::columns([
                            long_setting::Column::ScopeId,
                            long_setting::Column::GroupKey,
                            long_setting::Column::ValueKey,
                        ])
                        .update_columns([
                            long_setting::Column::Value,
                            long_setting::Column::UpdatedAt,
                        ])
                        .to_owned(),
                    )
                    .exec_without_returning(&*self.db)
                    .await
                    .map_err(|e| classify(row.table, e))?;
            }
            StorageTable::Override => return Err(read_only(row.table)),
        }
        Ok(())
    }

    async fn delete(
        &self,
        table: StorageTable,
        scope: ScopeId,
        group: &str,
        key: &str,
    ) -> Result<bool, StoreError> {
        let result = match table {
            StorageTable::Bounded => entity::Entity::delete_many()
                .filter(entity::Column::ScopeId.eq(scope.0))
                .filter(entity::Column::GroupKey.eq(group))
                .filter(entity::Column::ValueKey.eq(key))
                .exec(&*self.db)
                .await,
            StorageTable::Unbounded => long_setting::Entity::delete_many()
                .filter(long_setting::Column::ScopeId.eq(scope.0))
                .filter(long_setting::Column::GroupKey.eq(group))
                .filter(long_setting::Column::ValueKey.eq(key))
                .exec(&*self.db)
                .await,
            StorageTable::Override => return Err(read_only(table)),
        };

        let result = result.map_err(|e| classify(table, e))?;
        Ok(result.rows_affected > 0)
    }

    async fn list_all(&self, table: StorageTable) -> Result<Vec<SettingRow>, StoreError> {
        match table {
            StorageTable::Bounded => entity::Entity::find()
                .order_by_asc(entity::Column::ScopeId)
                .order_by_asc(entity::Column::GroupKey)
                .order_by_asc(entity::Column::ValueKey)
                .all(&*self.db)
                .await
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(|e| classify(table, e)),
            StorageTable::Unbounded => long_setting::Entity::find()
                .order_by_asc(long_setting::Column::ScopeId)
                .order_by_asc(long_setting::Column::GroupKey)
                .order_by_asc(long_setting::Column::ValueKey)
                .all(&*self.db)
                .await
                .map(|rows| rows.into_iter().map(Into::into).collect())
                .map_err(|e| classify(table, e)),
            StorageTable::Override => Ok(Vec::new()),
        }
    }
}
