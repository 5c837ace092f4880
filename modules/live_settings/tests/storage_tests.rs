//! Integration tests against SQLite through SeaORM

mod common;

use common::print_test_header;
use live_settings::config::Config;
use live_settings::contract::{NativeValue, ScopeId, SettingRow, SettingsApi, StorageTable};
use live_settings::domain::{FixedScopeResolver, Group, SettingsRepository, Value, ValueKind};
use live_settings::infra::storage::migrations::Migrator;
use live_settings::infra::storage::SeaOrmSettingsRepository;
use live_settings::LiveSettingsModule;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::{MigrationName, MigratorTrait};
use std::sync::Arc;

async fn memory_db() -> Arc<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    Arc::new(Database::connect(options).await.unwrap())
}

#[tokio::test]
async fn test_repository_crud_on_both_tables() {
    print_test_header(
        "test_repository_crud_on_both_tables",
        &["Rows are upserted, found, listed and deleted in both settings tables"],
    );
    let db = memory_db().await;
    Migrator::up(db.as_ref(), None).await.unwrap();
    let repo = SeaOrmSettingsRepository::new(db.clone());

    println!("\n📝 Stage 1: Upsert");
    let short = SettingRow::new(ScopeId(1), "SHOP", "NAME", "Acme", StorageTable::Bounded);
    let long = SettingRow::new(ScopeId(1), "SHOP", "TERMS", "x".repeat(2000), StorageTable::Unbounded);
    repo.upsert(&short).await.unwrap();
    repo.upsert(&long).await.unwrap();

    let replaced = SettingRow::new(ScopeId(1), "SHOP", "NAME", "Acme Ltd", StorageTable::Bounded);
    repo.upsert(&replaced).await.unwrap();

    println!("\n📝 Stage 2: Find");
    let found = repo
        .find(StorageTable::Bounded, ScopeId(1), "SHOP", "NAME")
        .await
        .unwrap();
    assert_eq!(found, Some(replaced));
    let found = repo
        .find(StorageTable::Unbounded, ScopeId(1), "SHOP", "TERMS")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.value.len(), 2000);
    assert!(repo
        .find(StorageTable::Bounded, ScopeId(2), "SHOP", "NAME")
        .await
        .unwrap()
        .is_none());

    println!("\n📝 Stage 3: List and delete");
    assert_eq!(repo.list_all(StorageTable::Bounded).await.unwrap().len(), 1);
    assert!(repo
        .delete(StorageTable::Bounded, ScopeId(1), "SHOP", "NAME")
        .await
        .unwrap());
    assert!(!repo
        .delete(StorageTable::Bounded, ScopeId(1), "SHOP", "NAME")
        .await
        .unwrap());
    assert!(repo.list_all(StorageTable::Bounded).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unmigrated_database_reports_missing_schema() {
    print_test_header(
        "test_unmigrated_database_reports_missing_schema",
        &["Queries against absent tables are classified as a missing schema"],
    );
    let db = memory_db().await;
    let repo = SeaOrmSettingsRepository::new(db);

    let err = repo
        .find(StorageTable::Bounded, ScopeId(1), "SHOP", "NAME")
        .await
        .unwrap_err();
    println!("   error: {}", err);
    assert!(err.is_schema_missing());
}

#[tokio::test]
async fn test_module_serves_defaults_until_migrated() {
    print_test_header(
        "test_module_serves_defaults_until_migrated",
        &[
            "A module started before migrations reads defaults",
            "After migrating, updates persist through the native client",
        ],
    );
    let db = memory_db().await;
    let module = LiveSettingsModule::default();
    let group = Group::builder("SHOP").build().unwrap();
    let name = module
        .registry()
        .register(
            Value::builder(&group, "NAME", ValueKind::String)
                .default("Shop")
                .build()
                .unwrap(),
        )
        .unwrap();

    let service = module.init_with(
        Config::default(),
        Arc::new(SeaOrmSettingsRepository::new(db.clone())),
        Arc::new(FixedScopeResolver::new(1)),
    );

    println!("\n📝 Stage 1: Before migrations");
    assert_eq!(
        service.native_value(&name).await.unwrap(),
        NativeValue::Text("Shop".into())
    );

    println!("\n📝 Stage 2: Migrate and write");
    module.migrate(db.as_ref()).await.unwrap();
    assert!(!service.is_bootstrapping());

    let client = module.client().unwrap();
    assert!(client
        .update_value("SHOP", "NAME", NativeValue::from("Acme"))
        .await
        .unwrap());
    assert_eq!(
        client.config_value("SHOP", "NAME").await.unwrap(),
        NativeValue::Text("Acme".into())
    );

    let yaml = service.to_yaml().await.unwrap();
    println!("{}", yaml);
    assert!(yaml.contains("NAME: Acme"));
}

#[tokio::test]
async fn test_migrations_have_distinct_names_and_rerun_cleanly() {
    print_test_header(
        "test_migrations_have_distinct_names_and_rerun_cleanly",
        &[
            "Each migration records its own name in the migration table",
            "Running the migrator again on a migrated database is a no-op",
        ],
    );
    let names: Vec<String> = Migrator::migrations()
        .iter()
        .map(|migration| migration.name().to_owned())
        .collect();
    println!("   migrations: {:?}", names);
    assert_eq!(
        names,
        vec![
            "m20251020_000001_create_settings",
            "m20251020_000002_create_long_settings"
        ]
    );

    let db = memory_db().await;
    Migrator::up(db.as_ref(), None).await.unwrap();
    Migrator::up(db.as_ref(), None).await.unwrap();
    assert!(Migrator::get_pending_migrations(db.as_ref())
        .await
        .unwrap()
        .is_empty());
}
