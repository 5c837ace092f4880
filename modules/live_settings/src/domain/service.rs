//! Domain service - resolution, update and accessor orchestration

use super::events::{EventPublisher, SettingEvent};
use super::group::{Group, Member};
use super::kind::CoerceError;
use super::overrides::{OverrideLayer, ResolvedOverrides};
use super::registry::{GroupRef, Registry};
use super::repository::{cache_key, SettingsCache, SettingsRepository};
use super::scope::ScopeResolver;
use super::validation::validate_bounded_length;
use super::value::Value;
use crate::config::{Config, ScopeOverrideConfig, BOUNDED_COLUMN_LENGTH};
use crate::contract::{
    Choice, ModuleDescriptor, ModuleHandle, NativeValue, ScopeId, SettingRow, SettingsError,
    SettingsExport, StorageTable, StoreError,
};
use crate::domain::modules::find_submodule;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Where a value's current state came from
#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    /// Persisted row (cache or store)
    Row(SettingRow),
    /// Stored string from the scope's override table
    Override(String),
    /// Declared default
    Default(NativeValue),
    /// No override, no row, no default
    Unset,
}

impl Resolved {
    fn stored(&self) -> Option<String> {
        match self {
            Resolved::Row(row) => Some(row.value.clone()),
            Resolved::Override(raw) => Some(raw.clone()),
            Resolved::Default(default) => Some(default.to_stored()),
            Resolved::Unset => None,
        }
    }
}

/// What a prepared update writes
#[derive(Debug, Clone, PartialEq)]
enum Change {
    /// New value equals the effective default: drop any persisted row
    Reset,
    /// Upsert into the kind's table
    Store(SettingRow),
}

/// Update that passed every check and only needs to be written
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingUpdate {
    scope: ScopeId,
    group: String,
    key: String,
    identity: String,
    old_stored: Option<String>,
    new_stored: String,
    change: Change,
}

/// Override configuration document produced by [`Service::to_yaml`]
#[derive(Debug, Serialize)]
struct OverridesDocument {
    overrides: Vec<ScopeOverrideConfig>,
}

/// Domain service for live settings
pub struct Service {
    registry: Arc<Registry>,
    repo: Arc<dyn SettingsRepository>,
    cache: Arc<dyn SettingsCache>,
    scopes: Arc<dyn ScopeResolver>,
    overrides: OverrideLayer,
    default_scope: ScopeId,
    default_language: String,
    max_value_length: usize,
    publishers: RwLock<Vec<Arc<dyn EventPublisher>>>,
    /// Open until the store is known to have its schema
    initializing: AtomicBool,
    bootstrap_warned: AtomicBool,
    /// Completed writes, compared around cache fills
    writes: AtomicU64,
}

impl Service {
    /// Create a new service instance
    pub fn new(
        registry: Arc<Registry>,
        repo: Arc<dyn SettingsRepository>,
        cache: Arc<dyn SettingsCache>,
        scopes: Arc<dyn ScopeResolver>,
        config: &Config,
    ) -> Self {
        Self {
            registry,
            repo,
            cache,
            scopes,
            overrides: OverrideLayer::from_config(&config.overrides),
            default_scope: ScopeId(config.default_scope),
            default_language: config.default_language.clone(),
            max_value_length: config.max_value_length.min(BOUNDED_COLUMN_LENGTH as usize),
            publishers: RwLock::new(Vec::new()),
            initializing: AtomicBool::new(true),
            bootstrap_warned: AtomicBool::new(false),
            writes: AtomicU64::new(0),
        }
    }

    /// Add an event publisher notified after every persisted change
    pub fn subscribe(&self, publisher: Arc<dyn EventPublisher>) {
        self.publishers.write().push(publisher);
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Active scope, falling back to the configured default
    pub fn current_scope(&self) -> ScopeId {
        self.scopes.current_scope().unwrap_or(self.default_scope)
    }

    /// Active language, falling back to the configured default
    pub fn current_language(&self) -> String {
        self.scopes
            .current_language()
            .unwrap_or_else(|| self.default_language.clone())
    }

    pub fn overrides_for(&self, scope: ScopeId) -> ResolvedOverrides {
        self.overrides.resolve(scope)
    }

    /// Whether the store is consulted (and writable) for the current scope
    pub fn is_db_enabled(&self) -> bool {
        self.overrides.resolve(self.current_scope()).db_allowed
    }

    /// Whether reads are still inside the startup window
    pub fn is_bootstrapping(&self) -> bool {
        self.initializing.load(Ordering::Acquire)
    }

    /// Close the startup window explicitly (e.g. after migrations ran)
    pub fn finish_bootstrap(&self) {
        self.initializing.store(false, Ordering::Release);
    }

    // ===== Value resolution =====

    /// Current native value of `value`; `ValueUnset` when nothing provides one
    pub async fn native_value(&self, value: &Value) -> Result<NativeValue, SettingsError> {
        self.native_value_for(value, self.current_scope()).await
    }

    /// Native value of `value` in an explicit scope
    pub async fn native_value_for(
        &self,
        value: &Value,
        scope: ScopeId,
    ) -> Result<NativeValue, SettingsError> {
        let resolved = self.resolve(value, scope).await?;
        self.to_native(value, resolved)
    }

    /// Like [`native_value`](Self::native_value), but unset coerces to the kind's type default
    pub async fn value_or_type_default(&self, value: &Value) -> Result<NativeValue, SettingsError> {
        match self.resolve(value, self.current_scope()).await? {
            Resolved::Unset => Ok(value.kind().type_default()),
            resolved => self.to_native(value, resolved),
        }
    }

    /// Display string for the settings editor; unset renders empty
    pub async fn editor_value(&self, value: &Value) -> Result<String, SettingsError> {
        match self.resolve(value, self.current_scope()).await? {
            Resolved::Unset => Ok(String::new()),
            resolved => {
                let native = self.to_native(value, resolved)?;
                Ok(value.kind().to_editor(&native))
            }
        }
    }

    /// Raw row backing `value`; override entries come back tagged [`StorageTable::Override`]
    pub async fn setting(&self, value: &Value) -> Result<SettingRow, SettingsError> {
        let scope = self.current_scope();
        let key = value.storage_key(&self.current_language());
        let identity = format!("{}.{}", value.group_key(), key);
        let overrides = self.overrides.resolve(scope);

        if !overrides.db_allowed {
            return overrides
                .entry(value.group_key(), &key)
                .map(|raw| {
                    SettingRow::new(scope, value.group_key(), &key, raw, StorageTable::Override)
                })
                .ok_or(SettingsError::ValueUnset { identity });
        }

        match self.find_row(scope, value.group_key(), &key).await {
            Ok(Some(row)) => Ok(row),
            Ok(None) => Err(SettingsError::ValueUnset { identity }),
            Err(e) => Err(self.store_failure(&identity, e)),
        }
    }

    async fn resolve(&self, value: &Value, scope: ScopeId) -> Result<Resolved, SettingsError> {
        let group = value.group_key();
        let key = value.storage_key(&self.current_language());
        let overrides = self.overrides.resolve(scope);

        if !overrides.db_allowed {
            if let Some(raw) = overrides.entry(group, &key) {
                tracing::debug!(scope = %scope, group, key = %key, "Serving setting from override table");
                return Ok(Resolved::Override(raw.to_owned()));
            }
            return match value.default() {
                Some(default) => Ok(Resolved::Default(default.clone())),
                None => Err(SettingsError::ConfigNotFound {
                    identity: format!("{}.{}", group, key),
                }),
            };
        }

        match self.find_row(scope, group, &key).await {
            Ok(Some(row)) => {
                self.finish_bootstrap();
                Ok(Resolved::Row(row))
            }
            Ok(None) => {
                self.finish_bootstrap();
                match value.default() {
                    // An override entry still shadows the default when the store is enabled
                    Some(default) => match overrides.entry(group, value.key()) {
                        Some(raw) => Ok(Resolved::Override(raw.to_owned())),
                        None => Ok(Resolved::Default(default.clone())),
                    },
                    None => Ok(Resolved::Unset),
                }
            }
            Err(StoreError::SchemaMissing { table }) if self.is_bootstrapping() => {
                if !self.bootstrap_warned.swap(true, Ordering::AcqRel) {
                    tracing::warn!(
                        table = %table,
                        "Settings table missing while starting up; serving defaults until migrations run"
                    );
                }
                match value.default() {
                    Some(default) => Ok(Resolved::Default(default.clone())),
                    None => Err(SettingsError::Configuration {
                        message: format!(
                            "All settings used in startup must have defaults, {}.{} does not",
                            group, key
                        ),
                    }),
                }
            }
            Err(e) => {
                self.finish_bootstrap();
                Err(self.store_failure(&format!("{}.{}", group, key), e))
            }
        }
    }

    fn to_native(&self, value: &Value, resolved: Resolved) -> Result<NativeValue, SettingsError> {
        match resolved {
            Resolved::Row(row) => value
                .kind()
                .from_stored(&row.value)
                .map_err(|e| coercion_error(value, e)),
            Resolved::Override(raw) => value
                .kind()
                .from_stored(&raw)
                .map_err(|e| coercion_error(value, e)),
            Resolved::Default(default) => Ok(default),
            Resolved::Unset => Err(SettingsError::unset(value.identity())),
        }
    }

    /// Cache, then the bounded table, then the unbounded one; misses are cached too.
    ///
    /// A fill that overlapped a completed write is dropped again, so the next read goes
    /// back to the store instead of serving the row read before the write.
    async fn find_row(
        &self,
        scope: ScopeId,
        group: &str,
        key: &str,
    ) -> Result<Option<SettingRow>, StoreError> {
        let ck = cache_key(scope, group, key);
        if let Some(cached) = self.cache.get(&ck).await {
            return Ok(cached);
        }

        let writes_before = self.writes.load(Ordering::SeqCst);
        let mut found = None;
        for table in StorageTable::PERSISTENT {
            if let Some(row) = self.repo.find(table, scope, group, key).await? {
                found = Some(row);
                break;
            }
        }

        self.cache.set(&ck, found.clone()).await;
        // A write that landed while the store was read may have been overwritten above
        if self.writes.load(Ordering::SeqCst) != writes_before {
            self.cache.delete(&ck).await;
        }
        Ok(found)
    }

    fn store_failure(&self, identity: &str, error: StoreError) -> SettingsError {
        tracing::error!(identity, error = %error, "Problem reading settings store");
        SettingsError::StoreUnavailable {
            identity: identity.to_owned(),
            details: error.to_string(),
        }
    }

    // ===== Updates =====

    /// Coerce, compare, then persist or delete-if-default. Returns whether anything changed.
    pub async fn update(
        &self,
        value: &Value,
        raw: impl Into<NativeValue>,
    ) -> Result<bool, SettingsError> {
        match self.prepare_update(value, raw.into()).await? {
            Some(pending) => {
                self.apply_update(pending).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Everything an update can reject, without writing: coercion, the update callback
    /// and the bounded length. `None` when the scope is locked or nothing changes.
    pub(crate) async fn prepare_update(
        &self,
        value: &Value,
        raw: NativeValue,
    ) -> Result<Option<PendingUpdate>, SettingsError> {
        let scope = self.current_scope();
        let group = value.group_key();
        let key = value.storage_key(&self.current_language());

        if !self.overrides.resolve(scope).db_allowed {
            tracing::debug!(
                scope = %scope,
                group,
                key = %key,
                "Not updating setting, database access is disabled for this scope"
            );
            return Ok(None);
        }

        let kind = value.kind();
        let new_value = kind.coerce(raw).map_err(|e| coercion_error(value, e))?;

        let resolved = self.resolve(value, scope).await?;
        let old_stored = resolved.stored();
        let current = match resolved {
            Resolved::Unset => kind.type_default(),
            resolved => self.to_native(value, resolved)?,
        };

        let mut new_value = kind.adjust_update(&current, new_value);
        if new_value == current {
            tracing::debug!(group, key = %key, "Setting unchanged");
            return Ok(None);
        }

        if let Some(callback) = value.update_callback() {
            new_value = kind
                .coerce(callback(&current, new_value))
                .map_err(|e| coercion_error(value, e))?;
        }

        let identity = format!("{}.{}", group, key);
        let change = if new_value == value.effective_default() {
            Change::Reset
        } else {
            let table = kind.storage_table();
            let stored = new_value.to_stored();
            if table == StorageTable::Bounded {
                validate_bounded_length(&identity, &stored, self.max_value_length)?;
            }
            Change::Store(SettingRow::new(scope, group, &key, stored, table))
        };

        Ok(Some(PendingUpdate {
            scope,
            group: group.to_owned(),
            key,
            identity,
            old_stored,
            new_stored: new_value.to_stored(),
            change,
        }))
    }

    /// Persist a prepared update, refresh the cache and publish the change
    pub(crate) async fn apply_update(&self, pending: PendingUpdate) -> Result<(), SettingsError> {
        let PendingUpdate {
            scope,
            group,
            key,
            identity,
            old_stored,
            new_stored,
            change,
        } = pending;
        let ck = cache_key(scope, &group, &key);
        let reset_to_default = matches!(change, Change::Reset);

        match change {
            Change::Reset => {
                let mut deleted = false;
                for table in StorageTable::PERSISTENT {
                    deleted |= self
                        .repo
                        .delete(table, scope, &group, &key)
                        .await
                        .map_err(|e| self.store_failure(&identity, e))?;
                }
                self.writes.fetch_add(1, Ordering::SeqCst);
                self.cache.delete(&ck).await;
                if deleted {
                    tracing::info!(scope = %scope, group = %group, key = %key, "Deleted setting");
                }
            }
            Change::Store(row) => {
                self.repo
                    .upsert(&row)
                    .await
                    .map_err(|e| self.store_failure(&identity, e))?;

                for other in StorageTable::PERSISTENT
                    .into_iter()
                    .filter(|t| *t != row.table)
                {
                    self.repo
                        .delete(other, scope, &group, &key)
                        .await
                        .map_err(|e| self.store_failure(&identity, e))?;
                }

                self.writes.fetch_add(1, Ordering::SeqCst);
                tracing::info!(scope = %scope, group = %group, key = %key, value = %row.value, "Updated setting");
                self.cache.set(&ck, Some(row)).await;
            }
        }

        let event = SettingEvent::value_changed(
            scope,
            &group,
            &key,
            old_stored,
            Some(new_stored),
            reset_to_default,
        );
        self.publish(event).await;
        Ok(())
    }

    async fn publish(&self, event: SettingEvent) {
        let publishers = self.publishers.read().clone();
        for publisher in publishers {
            if let Err(e) = publisher.publish(event.clone()).await {
                tracing::warn!(identity = %event.identity(), error = %e, "Failed to publish setting event");
            }
        }
    }

    // ===== Visibility =====

    /// Whether the value's dependency is satisfied; any failure counts as disabled
    pub async fn is_enabled(&self, value: &Value) -> bool {
        match value.requires() {
            None => true,
            Some(requirement) => match self.value_or_type_default(&requirement.target).await {
                Ok(current) => requirement.is_met_by(&current),
                Err(_) => false,
            },
        }
    }

    /// Group-level dependency, evaluated like a value's
    pub async fn group_enabled(&self, group: &Group) -> bool {
        match group.requires() {
            None => true,
            Some(requirement) => match self.value_or_type_default(&requirement.target).await {
                Ok(current) => requirement.is_met_by(&current),
                Err(_) => false,
            },
        }
    }

    /// Members whose dependency is currently satisfied, sorted
    pub async fn enabled_members(&self, group: &Group) -> Vec<Member> {
        let mut enabled = Vec::new();
        for member in group.members() {
            let visible = match &member {
                Member::Value(value) => self.is_enabled(value).await,
                Member::Group(child) => self.group_enabled(child).await,
            };
            if visible {
                enabled.push(member);
            }
        }
        enabled
    }

    /// Flat key -> native snapshot of every value in the group, enabled or not
    pub async fn dict_values(
        &self,
        group: &Group,
    ) -> Result<BTreeMap<String, NativeValue>, SettingsError> {
        let mut values = BTreeMap::new();
        for value in group.values() {
            let native = self.value_or_type_default(&value).await?;
            values.insert(value.key().to_owned(), native);
        }
        Ok(values)
    }

    /// Choices whose key is currently selected
    pub async fn choice_values(&self, value: &Value) -> Result<Vec<Choice>, SettingsError> {
        let current = self.value_or_type_default(value).await?;
        Ok(value
            .choices()
            .into_iter()
            .filter(|choice| current.selects(&choice.key))
            .collect())
    }

    /// Resolve `<configured module>.<name>` for a module value
    pub async fn load_submodule(
        &self,
        value: &Value,
        name: &str,
    ) -> Result<Option<&'static ModuleDescriptor>, SettingsError> {
        match self.native_value(value).await? {
            NativeValue::Module(ModuleHandle::Loaded(parent)) => Ok(find_submodule(parent, name)),
            NativeValue::Module(ModuleHandle::Unresolved) => Ok(None),
            NativeValue::Module(ModuleHandle::Empty) => Err(SettingsError::unset(value.identity())),
            other => Err(SettingsError::validation(format!(
                "{} is not a module value: {}",
                value.identity(),
                other
            ))),
        }
    }

    // ===== Accessors =====

    pub fn config_get(&self, group: &str, key: &str) -> Result<Arc<Value>, SettingsError> {
        self.registry.lookup(group, key)
    }

    pub fn config_get_group(&self, group: &str) -> Result<Arc<Group>, SettingsError> {
        self.registry
            .group(GroupRef::from(group))
            .ok_or_else(|| SettingsError::ConfigNotFound {
                identity: group.to_owned(),
            })
    }

    pub fn config_exists(&self, group: &str, key: &str) -> bool {
        self.registry.has_config(group, key)
    }

    pub async fn config_value(&self, group: &str, key: &str) -> Result<NativeValue, SettingsError> {
        let value = self.registry.lookup(group, key)?;
        self.native_value(&value).await
    }

    /// `default` when the setting is unregistered or unset; other failures propagate
    pub async fn config_value_or(
        &self,
        group: &str,
        key: &str,
        default: NativeValue,
    ) -> Result<NativeValue, SettingsError> {
        match self.config_value(group, key).await {
            Err(e) if e.is_missing() => Ok(default),
            other => other,
        }
    }

    /// Never fails: any error is logged and `default` returned
    pub async fn config_value_safe(
        &self,
        group: &str,
        key: &str,
        default: NativeValue,
    ) -> NativeValue {
        match self.config_value(group, key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(group, key, error = %e, "Using fallback for setting");
                default
            }
        }
    }

    /// Read a list of group keys from `group.groupkey`, then `key` in each of those groups
    pub async fn config_collect_values(
        &self,
        group: &str,
        groupkey: &str,
        key: &str,
        unique: bool,
        skip_missing: bool,
    ) -> Result<Vec<NativeValue>, SettingsError> {
        let selector = self.registry.lookup(group, groupkey)?;
        let group_keys = match self.value_or_type_default(&selector).await? {
            NativeValue::List(items) => items,
            other => vec![other.to_stored()],
        };

        let mut collected: Vec<NativeValue> = Vec::new();
        for group_key in group_keys {
            match self.config_value(&group_key, key).await {
                Ok(value) => {
                    if !unique || !collected.contains(&value) {
                        collected.push(value);
                    }
                }
                Err(e) if skip_missing && e.is_missing() => {
                    tracing::debug!(group = %group_key, key, "Skipping missing setting");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(collected)
    }

    pub async fn config_choice_values(
        &self,
        group: &str,
        key: &str,
        skip_missing: bool,
    ) -> Result<Vec<Choice>, SettingsError> {
        let value = match self.registry.lookup(group, key) {
            Ok(value) => value,
            Err(_) if skip_missing => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        self.choice_values(&value).await
    }

    pub fn config_add_choice(&self, group: &str, key: &str, choice: impl Into<Choice>) {
        self.registry.add_choice(group, key, choice);
    }

    // ===== Export =====

    /// Every persisted row, scope -> group -> key; bounded rows win over unbounded ones
    pub async fn export(&self) -> Result<SettingsExport, SettingsError> {
        let mut export = SettingsExport::default();
        for table in [StorageTable::Unbounded, StorageTable::Bounded] {
            let rows = self
                .repo
                .list_all(table)
                .await
                .map_err(|e| self.store_failure(table.as_str(), e))?;
            for row in rows {
                export
                    .scopes
                    .entry(row.scope)
                    .or_default()
                    .entry(row.group)
                    .or_default()
                    .insert(row.key, row.value);
            }
        }
        Ok(export)
    }

    /// Export converted to lockdown entries (`db: false`) for the configuration file
    pub async fn export_overrides(&self) -> Result<Vec<ScopeOverrideConfig>, SettingsError> {
        let export = self.export().await?;
        Ok(export
            .scopes
            .into_iter()
            .map(|(scope, settings)| ScopeOverrideConfig {
                scope: scope.0,
                db: false,
                settings,
            })
            .collect())
    }

    /// YAML `overrides:` document ready to paste into the configuration
    pub async fn to_yaml(&self) -> Result<String, SettingsError> {
        let document = OverridesDocument {
            overrides: self.export_overrides().await?,
        };
        serde_yaml::to_string(&document)
            .map_err(|e| SettingsError::internal(format!("failed to render export: {}", e)))
    }
}

fn coercion_error(value: &Value, error: CoerceError) -> SettingsError {
    SettingsError::Coercion {
        identity: value.identity(),
        raw: error.raw,
        reason: error.reason,
    }
}
