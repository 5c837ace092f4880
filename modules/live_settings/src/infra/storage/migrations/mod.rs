//! Database migrations for live settings

use crate::config::BOUNDED_COLUMN_LENGTH;
use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251020_000001_create_settings::Migration),
            Box::new(m20251020_000002_create_long_settings::Migration),
        ]
    }
}

mod m20251020_000001_create_settings {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20251020_000001_create_settings"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Settings::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Settings::ScopeId).big_integer().not_null())
                        .col(ColumnDef::new(Settings::GroupKey).string_len(100).not_null())
                        .col(ColumnDef::new(Settings::ValueKey).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Settings::Value)
                                .string_len(BOUNDED_COLUMN_LENGTH)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Settings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .primary_key(
                            Index::create()
                                .col(Settings::ScopeId)
                                .col(Settings::GroupKey)
                                .col(Settings::ValueKey),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_settings_scope_id")
                        .table(Settings::Table)
                        .col(Settings::ScopeId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Settings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Settings {
        Table,
        ScopeId,
        GroupKey,
        ValueKey,
        Value,
        UpdatedAt,
    }
}

mod m20251020_000002_create_long_settings {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20251020_000002_create_long_settings"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(LongSettings::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(LongSettings::ScopeId).big_integer().not_null())
                        .col(ColumnDef::new(LongSettings::GroupKey).string_len(100).not_null())
                        .col(ColumnDef::new(LongSettings::ValueKey).string_len(255).not_null())
                        .col(ColumnDef::new(LongSettings::Value).text().not_null())
                        .col(
                            ColumnDef::new(LongSettings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .primary_key(
                            Index::create()
                                .col(LongSettings::ScopeId)
                                .col(LongSettings::GroupKey)
                                .col(LongSettings::ValueKey),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_long_settings_scope_id")
                        .table(LongSettings::Table)
                        .col(LongSettings::ScopeId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LongSettings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum LongSettings {
        Table,
        ScopeId,
        GroupKey,
        ValueKey,
        Value,
        UpdatedAt,
    }
}
