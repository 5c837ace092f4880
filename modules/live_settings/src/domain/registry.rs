//! Registry of groups and values
//!
//! One explicit instance is shared by `Arc` between the service, the editor and the
//! host application. Lock order is `pending` -> `groups` -> `super_groups`.

use super::group::{Group, SuperGroup};
use super::kind::ValueKind;
use super::validation::validate_key;
use super::value::{Value, ValueBuilder};
use crate::contract::{Choice, SettingsError};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the super group collecting groups registered without one
pub const BASE_SUPER_GROUP_NAME: &str = "Main";

/// How a caller names a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    /// By key
    Key(String),
    /// By position in the sorted group list
    Index(usize),
}

impl GroupRef {
    fn describe(&self) -> String {
        match self {
            GroupRef::Key(key) => key.clone(),
            GroupRef::Index(index) => format!("#{index}"),
        }
    }
}

impl From<&str> for GroupRef {
    fn from(key: &str) -> Self {
        GroupRef::Key(key.to_owned())
    }
}

impl From<String> for GroupRef {
    fn from(key: String) -> Self {
        GroupRef::Key(key)
    }
}

impl From<usize> for GroupRef {
    fn from(index: usize) -> Self {
        GroupRef::Index(index)
    }
}

/// Map of group key -> group, plus pre-registered choices and super groups
pub struct Registry {
    pending: Mutex<HashMap<(String, String), Vec<Choice>>>,
    groups: RwLock<IndexMap<String, Arc<Group>>>,
    super_groups: RwLock<Vec<Arc<SuperGroup>>>,
    base_super_group: Arc<SuperGroup>,
    base_group: Arc<Group>,
}

impl Default for Registry {
    fn default() -> Self {
        let base_super_group = SuperGroup::new(BASE_SUPER_GROUP_NAME, 0);
        Self {
            pending: Mutex::new(HashMap::new()),
            groups: RwLock::new(IndexMap::new()),
            super_groups: RwLock::new(vec![Arc::clone(&base_super_group)]),
            base_super_group,
            base_group: Group::base(),
        }
    }
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The built-in `BASE` group; joins the registry with its first value
    pub fn base_group(&self) -> &Arc<Group> {
        &self.base_group
    }

    pub fn base_super_group(&self) -> &Arc<SuperGroup> {
        &self.base_super_group
    }

    /// Register a value, inserting its group on first sight.
    ///
    /// The first group registered under a key wins; re-registering a value key replaces
    /// the member in place. Pre-registered choices for the value are applied in call order.
    pub fn register(&self, value: Value) -> Result<Arc<Value>, SettingsError> {
        validate_key("group", value.group_key())?;
        validate_key("value", value.key())?;

        let pending = self.pending.lock();
        let mut groups = self.groups.write();

        if let Some(choices) = pending.get(&(value.group_key().to_owned(), value.key().to_owned()))
        {
            for choice in choices {
                value.add_choice(choice.clone());
            }
        }

        let group = match groups.get(value.group_key()) {
            Some(existing) => Arc::clone(existing),
            None => {
                let group = Arc::clone(value.group());
                groups.insert(group.key().to_owned(), Arc::clone(&group));
                self.attach_super_group(&group);
                group
            }
        };

        let value = Arc::new(value);
        group.insert_value(Arc::clone(&value));

        tracing::debug!(
            group = %group.key(),
            key = %value.key(),
            kind = value.kind().name(),
            "Registered setting"
        );
        Ok(value)
    }

    /// Register a value in an already registered group
    pub fn register_under<F>(
        &self,
        group_key: &str,
        key: &str,
        kind: ValueKind,
        configure: F,
    ) -> Result<Arc<Value>, SettingsError>
    where
        F: FnOnce(ValueBuilder) -> ValueBuilder,
    {
        let group = self
            .groups
            .read()
            .get(group_key)
            .cloned()
            .ok_or_else(|| SettingsError::not_found(group_key, key))?;
        let value = configure(Value::builder(&group, key, kind)).build()?;
        self.register(value)
    }

    /// Register a group (even without values) followed by `values`
    pub fn register_group(
        &self,
        group: &Arc<Group>,
        values: Vec<Value>,
    ) -> Result<Vec<Arc<Value>>, SettingsError> {
        validate_key("group", group.key())?;
        {
            let _pending = self.pending.lock();
            let mut groups = self.groups.write();
            if !groups.contains_key(group.key()) {
                groups.insert(group.key().to_owned(), Arc::clone(group));
                self.attach_super_group(group);
                tracing::debug!(group = %group.key(), "Registered settings group");
            }
        }
        self.register_list(values)
    }

    pub fn register_list(&self, values: Vec<Value>) -> Result<Vec<Arc<Value>>, SettingsError> {
        values.into_iter().map(|value| self.register(value)).collect()
    }

    pub fn register_super_group(&self, super_group: &Arc<SuperGroup>) {
        let mut super_groups = self.super_groups.write();
        if !super_groups.iter().any(|existing| Arc::ptr_eq(existing, super_group)) {
            super_groups.push(Arc::clone(super_group));
        }
    }

    /// Super groups sorted by (ordering, name)
    pub fn super_groups(&self) -> Vec<Arc<SuperGroup>> {
        let mut super_groups = self.super_groups.read().clone();
        super_groups.sort_by(|a, b| {
            (a.ordering(), a.name()).cmp(&(b.ordering(), b.name()))
        });
        super_groups
    }

    fn attach_super_group(&self, group: &Arc<Group>) {
        let super_group = group
            .super_group()
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.base_super_group));
        super_group.append(group.key());
        self.register_super_group(&super_group);
    }

    /// Resolve `(group, key)` to a registered value
    pub fn lookup(
        &self,
        group: impl Into<GroupRef>,
        key: &str,
    ) -> Result<Arc<Value>, SettingsError> {
        let group_ref = group.into();
        let identity = || SettingsError::ConfigNotFound {
            identity: format!("{}.{}", group_ref.describe(), key),
        };
        let group = self.group(group_ref.clone()).ok_or_else(identity)?;
        group.value(key).ok_or_else(identity)
    }

    pub fn group(&self, group: impl Into<GroupRef>) -> Option<Arc<Group>> {
        match group.into() {
            GroupRef::Key(key) => self.groups.read().get(&key).cloned(),
            GroupRef::Index(index) => self.groups().into_iter().nth(index),
        }
    }

    /// Registered groups sorted by (ordering, name, creation sequence)
    pub fn groups(&self) -> Vec<Arc<Group>> {
        let mut groups: Vec<Arc<Group>> = self.groups.read().values().cloned().collect();
        groups.sort_by_cached_key(|group| group.sort_key());
        groups
    }

    pub fn has_config(&self, group: &str, key: &str) -> bool {
        self.groups
            .read()
            .get(group)
            .is_some_and(|group| group.value(key).is_some())
    }

    /// Number of registered groups
    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }

    /// Store a choice to be added when `(group, key)` is registered
    pub fn preregister_choice(&self, group: &str, key: &str, choice: impl Into<Choice>) {
        self.pending
            .lock()
            .entry((group.to_owned(), key.to_owned()))
            .or_default()
            .push(choice.into());
    }

    /// Add a choice now if the value is registered, otherwise pre-register it
    pub fn add_choice(&self, group: &str, key: &str, choice: impl Into<Choice>) {
        let choice = choice.into();
        let mut pending = self.pending.lock();
        let target = self
            .groups
            .read()
            .get(group)
            .and_then(|group| group.value(key));
        match target {
            Some(value) => {
                value.add_choice(choice);
            }
            None => pending
                .entry((group.to_owned(), key.to_owned()))
                .or_default()
                .push(choice),
        }
    }

    /// Forget every group, value, pre-registered choice and super group
    pub fn reset(&self) {
        let mut pending = self.pending.lock();
        let mut groups = self.groups.write();
        let mut super_groups = self.super_groups.write();

        for group in groups.values() {
            group.clear();
        }
        self.base_group.clear();
        groups.clear();
        pending.clear();

        self.base_super_group.clear();
        super_groups.clear();
        super_groups.push(Arc::clone(&self.base_super_group));
        tracing::debug!("Settings registry reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::new();
        let group = Group::builder("SHOP").name("Shop").build().unwrap();
        registry
            .register(Value::builder(&group, "NAME", ValueKind::String).build().unwrap())
            .unwrap();

        assert!(registry.has_config("SHOP", "NAME"));
        assert!(!registry.has_config("SHOP", "MISSING"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("SHOP", "NAME").unwrap().key(), "NAME");
        assert_eq!(registry.lookup(0usize, "NAME").unwrap().key(), "NAME");

        let err = registry.lookup("SHOP", "MISSING").unwrap_err();
        assert_eq!(
            err,
            SettingsError::ConfigNotFound {
                identity: "SHOP.MISSING".to_owned()
            }
        );
    }

    #[test]
    fn test_first_group_registration_wins() {
        let registry = Registry::new();
        let first = Group::builder("SHOP").name("First").build().unwrap();
        let second = Group::builder("SHOP").name("Second").build().unwrap();
        registry
            .register(Value::builder(&first, "A", ValueKind::String).build().unwrap())
            .unwrap();
        registry
            .register(Value::builder(&second, "B", ValueKind::String).build().unwrap())
            .unwrap();

        let group = registry.group("SHOP").unwrap();
        assert_eq!(group.name(), Some("First"));
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_register_under_requires_group() {
        let registry = Registry::new();
        let err = registry
            .register_under("NOPE", "KEY", ValueKind::String, |b| b)
            .unwrap_err();
        assert!(matches!(err, SettingsError::ConfigNotFound { .. }));

        let group = Group::builder("YES").build().unwrap();
        registry.register_group(&group, Vec::new()).unwrap();
        let value = registry
            .register_under("YES", "KEY", ValueKind::Integer, |b| b.default(3))
            .unwrap();
        assert_eq!(value.identity(), "YES.KEY");
    }

    #[test]
    fn test_groups_and_super_groups() {
        let registry = Registry::new();
        let extra = SuperGroup::new("Extra", 10);
        let late = Group::builder("LATE").name("Late").ordering(5).super_group(&extra).build().unwrap();
        let early = Group::builder("EARLY").name("Early").ordering(-1).build().unwrap();
        registry.register_group(&late, Vec::new()).unwrap();
        registry.register_group(&early, Vec::new()).unwrap();

        let keys: Vec<_> = registry.groups().iter().map(|g| g.key().to_owned()).collect();
        assert_eq!(keys, vec!["EARLY", "LATE"]);

        let super_groups = registry.super_groups();
        assert_eq!(super_groups.len(), 2);
        assert_eq!(super_groups[0].name(), BASE_SUPER_GROUP_NAME);
        assert_eq!(super_groups[0].group_keys(), vec!["EARLY"]);
        assert_eq!(super_groups[1].group_keys(), vec!["LATE"]);
    }

    #[test]
    fn test_preregistered_choices_applied_in_order() {
        let registry = Registry::new();
        registry.preregister_choice("SHOP", "MODULES", "one");
        registry.preregister_choice("SHOP", "MODULES", ("two", "Two"));

        let group = Group::container("SHOP");
        let value = registry
            .register(
                Value::builder(&group, "MODULES", ValueKind::MultipleString)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(
            value.choices(),
            vec![Choice::from("one"), Choice::new("two", "Two")]
        );

        registry.add_choice("SHOP", "MODULES", "three");
        assert_eq!(value.choices().len(), 3);
    }

    #[test]
    fn test_reset_clears_everything() {
        let registry = Registry::new();
        let group = Group::container("SHOP");
        registry
            .register(Value::builder(&group, "A", ValueKind::String).build().unwrap())
            .unwrap();
        registry.preregister_choice("SHOP", "B", "x");
        registry.reset();

        assert!(registry.is_empty());
        assert!(!registry.has_config("SHOP", "A"));
        assert_eq!(registry.super_groups().len(), 1);
        assert!(registry.base_super_group().group_keys().is_empty());
        assert!(group.is_empty());
    }
}
