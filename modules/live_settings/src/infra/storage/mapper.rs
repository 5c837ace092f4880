//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models

use super::entity;
use crate::contract::{ScopeId, SettingRow, StorageTable};

// ===== Bounded Table Conversions =====

impl From<entity::Model> for SettingRow {
    fn from(entity: entity::Model) -> Self {
        Self {
            scope: ScopeId(entity.scope_id),
            group: entity.group_key,
            key: entity.value_key,
            value: entity.value,
            table: StorageTable::Bounded,
        }
    }
}

impl From<&SettingRow> for entity::ActiveModel {
    fn from(row: &SettingRow) -> Self {
        use sea_orm::ActiveValue::*;

        Self {
            scope_id: Set(row.scope.0),
            group_key: Set(row.group.clone()),
            value_key: Set(row.key.clone()),
            value: Set(row.value.clone()),
            updated_at: Set(chrono::Utc::now()),
        }
    }
}

// ===== Unbounded Table Conversions =====

impl From<entity::long_setting::Model> for SettingRow {
    fn from(entity: entity::long_setting::Model) -> Self {
        Self {
            scope: ScopeId(entity.scope_id),
            group: entity.group_key,
            key: entity.value_key,
            value: entity.value,
            table: StorageTable::Unbounded,
        }
    }
}

impl From<&SettingRow> for entity::long_setting::ActiveModel {
    fn from(row: &SettingRow) -> Self {
        use sea_orm::ActiveValue::*;

        Self {
            scope_id: Set(row.scope.0),
            group_key: Set(row.group.clone()),
            value_key: Set(row.key.clone()),
            value: Set(row.value.clone()),
            updated_at: Set(chrono::Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    #[test]
    fn test_bounded_model_to_row() {
        let model = entity::Model {
            scope_id: 3,
            group_key: "SHOP".to_string(),
            value_key: "NAME".to_string(),
            value: "Acme".to_string(),
            updated_at: chrono::Utc::now(),
        };

        let row: SettingRow = model.into();
        assert_eq!(row.scope, ScopeId(3));
        assert_eq!(row.identity(), "SHOP.NAME");
        assert_eq!(row.table, StorageTable::Bounded);
    }

    #[test]
    fn test_row_to_long_active_model() {
        let row = SettingRow::new(ScopeId(1), "SHOP", "TERMS", "long text", StorageTable::Unbounded);
        let active: entity::long_setting::ActiveModel = (&row).into();
        assert_eq!(active.scope_id, ActiveValue::Set(1));
        assert_eq!(active.value, ActiveValue::Set("long text".to_string()));
    }
}
