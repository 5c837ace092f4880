//! Integration tests for the settings editor

mod common;

use common::{override_entry, print_test_header, TestEnv};
use live_settings::config::Config;
use live_settings::contract::{NativeValue, StorageTable};
use live_settings::domain::{Group, SettingsEditor, Submission, Value, ValueKind, Widget};

fn register_shop(env: &TestEnv) {
    let group = Group::builder("SHOP").name("Shop").build().unwrap();
    let values = vec![
        Value::builder(&group, "NAME", ValueKind::String)
            .description("Shop name")
            .default("Shop")
            .build()
            .unwrap(),
        Value::builder(&group, "ENABLED", ValueKind::Boolean)
            .description("Open for business")
            .build()
            .unwrap(),
        Value::builder(&group, "LIMIT", ValueKind::PositiveInteger)
            .description("Order limit")
            .build()
            .unwrap(),
        Value::builder(&group, "CURRENCY", ValueKind::String)
            .description("Currency")
            .choices([("EUR", "Euro"), ("USD", "US Dollar")])
            .default("EUR")
            .build()
            .unwrap(),
        Value::builder(&group, "TAGS", ValueKind::MultipleString)
            .description("Tags")
            .choices(["new", "sale", "gift"])
            .build()
            .unwrap(),
    ];
    env.registry.register_group(&group, values).unwrap();
}

#[tokio::test]
async fn test_fields_describe_values() {
    print_test_header(
        "test_fields_describe_values",
        &["Each value becomes a GROUP__KEY field with widget, initial value and default note"],
    );
    let env = TestEnv::new();
    register_shop(&env);

    let editor = SettingsEditor::for_group(env.service.clone(), "SHOP")
        .await
        .unwrap();
    let fields = editor.fields().await.unwrap();
    for field in &fields {
        println!("   {} [{:?}] initial={:?} {}", field.name, field.widget, field.initial, field.default_text);
    }

    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["SHOP__CURRENCY", "SHOP__ENABLED", "SHOP__LIMIT", "SHOP__NAME", "SHOP__TAGS"]
    );

    let currency = &fields[0];
    assert_eq!(currency.widget, Widget::Select);
    assert_eq!(currency.initial, "EUR");
    assert_eq!(currency.default_text, "Default value: Euro");

    let enabled = &fields[1];
    assert_eq!(enabled.widget, Widget::Checkbox);
    assert_eq!(enabled.default_text, "");

    let limit = &fields[2];
    assert_eq!(limit.widget, Widget::Text);
    assert_eq!(limit.initial, "");

    assert_eq!(fields[4].widget, Widget::MultiSelect);
}

#[tokio::test]
async fn test_invalid_submission_applies_nothing() {
    print_test_header(
        "test_invalid_submission_applies_nothing",
        &["Any invalid field rejects the whole form with per-field messages"],
    );
    let env = TestEnv::new();
    register_shop(&env);
    let editor = SettingsEditor::for_group(env.service.clone(), "SHOP")
        .await
        .unwrap();

    let submission = Submission::from_pairs([
        ("SHOP__NAME", "Acme"),
        ("SHOP__ENABLED", "on"),
        ("SHOP__LIMIT", "-5"),
        ("SHOP__CURRENCY", "XXX"),
    ]);
    let rejected = editor.submit(&submission).await.unwrap_err();
    println!("   errors: {:?}", rejected.errors);

    assert_eq!(rejected.errors.len(), 2);
    assert_eq!(
        rejected.errors["SHOP__LIMIT"],
        "Ensure this value is greater than or equal to 0."
    );
    assert_eq!(
        rejected.errors["SHOP__CURRENCY"],
        "Select a valid choice. XXX is not one of the available choices."
    );
    assert_eq!(env.repo.count(StorageTable::Bounded), 0);
}

#[tokio::test]
async fn test_valid_submission_updates_changed_fields() {
    print_test_header(
        "test_valid_submission_updates_changed_fields",
        &["Changed fields are written and reported, unchanged ones are left alone"],
    );
    let env = TestEnv::new();
    register_shop(&env);
    let editor = SettingsEditor::for_group(env.service.clone(), "SHOP")
        .await
        .unwrap();

    let submission = Submission::from_pairs([
        ("SHOP__NAME", "Shop"),
        ("SHOP__ENABLED", "on"),
        ("SHOP__LIMIT", "3"),
        ("SHOP__CURRENCY", "USD"),
        ("SHOP__TAGS", "new"),
        ("SHOP__TAGS", "gift"),
    ]);
    let outcome = editor.submit(&submission).await.unwrap();
    env.print_state("after submit").await;

    assert_eq!(
        outcome.updated,
        vec!["SHOP.CURRENCY", "SHOP.ENABLED", "SHOP.LIMIT", "SHOP.TAGS"]
    );
    assert!(outcome.messages.contains(&"Updated CURRENCY on SHOP".to_string()));
    assert_eq!(
        env.service.config_value("SHOP", "TAGS").await.unwrap(),
        NativeValue::List(vec!["new".into(), "gift".into()])
    );

    println!("\n📝 Unchecked checkbox turns the value off");
    let submission = Submission::from_pairs([
        ("SHOP__NAME", "Shop"),
        ("SHOP__LIMIT", "3"),
        ("SHOP__CURRENCY", "USD"),
        ("SHOP__TAGS", "new"),
        ("SHOP__TAGS", "gift"),
    ]);
    let outcome = editor.submit(&submission).await.unwrap();
    assert_eq!(outcome.updated, vec!["SHOP.ENABLED"]);
    // Back to the type default, so the row is gone
    assert_eq!(env.stored(StorageTable::Bounded, "SHOP", "ENABLED").await, None);
}

#[tokio::test]
async fn test_editor_is_read_only_in_override_mode() {
    print_test_header(
        "test_editor_is_read_only_in_override_mode",
        &["A locked scope shows its values but applies no submission"],
    );
    let config = Config {
        overrides: vec![override_entry(1, false, &[("SHOP", "NAME", "Locked")])],
        ..Config::default()
    };
    let env = TestEnv::with_config(config);
    register_shop(&env);

    let editor = SettingsEditor::for_registry(env.service.clone()).await;
    assert!(editor.is_read_only());
    let name = editor
        .fields()
        .await
        .unwrap()
        .into_iter()
        .find(|f| f.name == "SHOP__NAME")
        .unwrap();
    assert_eq!(name.initial, "Locked");
    let limit = editor
        .fields()
        .await
        .unwrap()
        .into_iter()
        .find(|f| f.name == "SHOP__LIMIT")
        .unwrap();
    assert_eq!(limit.initial, "");

    let outcome = editor
        .submit(&Submission::from_pairs([("SHOP__NAME", "Other")]))
        .await
        .unwrap();
    assert!(outcome.updated.is_empty());
}

#[tokio::test]
async fn test_registry_editor_skips_disabled_values() {
    print_test_header(
        "test_registry_editor_skips_disabled_values",
        &["Values whose requirement is unmet are not part of the form"],
    );
    let env = TestEnv::new();
    let group = Group::builder("MAIL").build().unwrap();
    let enabled = env
        .registry
        .register(Value::builder(&group, "ENABLED", ValueKind::Boolean).build().unwrap())
        .unwrap();
    env.registry
        .register(
            Value::builder(&group, "HOST", ValueKind::String)
                .requires(&enabled)
                .build()
                .unwrap(),
        )
        .unwrap();

    let editor = SettingsEditor::for_registry(env.service.clone()).await;
    let keys: Vec<&str> = editor.values().iter().map(|v| v.key()).collect();
    assert_eq!(keys, vec!["ENABLED"]);

    env.service.update(&enabled, true).await.unwrap();
    let editor = SettingsEditor::for_registry(env.service.clone()).await;
    assert_eq!(editor.values().len(), 2);
}

#[tokio::test]
async fn test_overlong_field_rejects_whole_form() {
    print_test_header(
        "test_overlong_field_rejects_whole_form",
        &["A value too long for the bounded table rejects the form before anything is written"],
    );
    let env = TestEnv::new();
    let group = Group::builder("NOTES").build().unwrap();
    let values = vec![
        Value::builder(&group, "A", ValueKind::String).build().unwrap(),
        Value::builder(&group, "B", ValueKind::String).build().unwrap(),
    ];
    env.registry.register_group(&group, values).unwrap();
    let editor = SettingsEditor::for_group(env.service.clone(), "NOTES")
        .await
        .unwrap();

    let long = "x".repeat(300);
    let rejected = editor
        .submit(&Submission::from_pairs([("NOTES__A", "applied"), ("NOTES__B", long.as_str())]))
        .await
        .unwrap_err();
    println!("   errors: {:?}", rejected.errors);

    assert_eq!(rejected.errors.len(), 1);
    assert!(rejected.errors["NOTES__B"].contains("300"));
    assert_eq!(env.stored(StorageTable::Bounded, "NOTES", "A").await, None);
    assert_eq!(env.repo.count(StorageTable::Bounded), 0);
}

#[tokio::test]
async fn test_callback_failure_rejects_whole_form() {
    print_test_header(
        "test_callback_failure_rejects_whole_form",
        &["An update callback producing an invalid value rejects every field of the form"],
    );
    let env = TestEnv::new();
    let group = Group::builder("SHOP").build().unwrap();
    let values = vec![
        Value::builder(&group, "NAME", ValueKind::String).build().unwrap(),
        Value::builder(&group, "LIMIT", ValueKind::Integer)
            .update_callback(|_old, _new| NativeValue::from("not a number"))
            .build()
            .unwrap(),
    ];
    env.registry.register_group(&group, values).unwrap();
    let editor = SettingsEditor::for_group(env.service.clone(), "SHOP")
        .await
        .unwrap();

    let rejected = editor
        .submit(&Submission::from_pairs([("SHOP__NAME", "Acme"), ("SHOP__LIMIT", "5")]))
        .await
        .unwrap_err();
    assert_eq!(rejected.errors.keys().collect::<Vec<_>>(), vec!["SHOP__LIMIT"]);
    assert_eq!(env.stored(StorageTable::Bounded, "SHOP", "NAME").await, None);
}
