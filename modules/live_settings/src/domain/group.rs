//! Groups of values and presentation super groups

use super::validation::validate_key;
use super::value::{next_sequence, SortKey, Value};
use super::visibility::Requirement;
use crate::contract::{Choice, SettingsError};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Key of the built-in base group
pub const BASE_GROUP_KEY: &str = "BASE";

/// Entry of a group: a value or a nested group
#[derive(Clone)]
pub enum Member {
    Value(Arc<Value>),
    Group(Arc<Group>),
}

impl Member {
    pub fn key(&self) -> &str {
        match self {
            Member::Value(value) => value.key(),
            Member::Group(group) => group.key(),
        }
    }

    pub fn sort_key(&self) -> SortKey {
        match self {
            Member::Value(value) => value.sort_key(),
            Member::Group(group) => group.sort_key(),
        }
    }

    pub fn as_value(&self) -> Option<&Arc<Value>> {
        match self {
            Member::Value(value) => Some(value),
            Member::Group(_) => None,
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Value(value) => value.fmt(f),
            Member::Group(group) => group.fmt(f),
        }
    }
}

/// Ordered, keyed collection of values
pub struct Group {
    key: String,
    name: Option<String>,
    ordering: i32,
    requires: Option<Requirement>,
    super_group: Option<Arc<SuperGroup>>,
    sequence: u64,
    members: RwLock<IndexMap<String, Member>>,
}

impl Group {
    pub fn builder(key: impl Into<String>) -> GroupBuilder {
        GroupBuilder::new(key)
    }

    /// Nameless group with default ordering
    pub fn container(key: impl Into<String>) -> Arc<Group> {
        Arc::new(Group {
            key: key.into(),
            name: None,
            ordering: 1,
            requires: None,
            super_group: None,
            sequence: next_sequence(),
            members: RwLock::new(IndexMap::new()),
        })
    }

    /// The `BASE` group ("Base Settings", ordering 0)
    pub(crate) fn base() -> Arc<Group> {
        Arc::new(Group {
            key: BASE_GROUP_KEY.to_owned(),
            name: Some("Base Settings".to_owned()),
            ordering: 0,
            requires: None,
            super_group: None,
            sequence: next_sequence(),
            members: RwLock::new(IndexMap::new()),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ordering(&self) -> i32 {
        self.ordering
    }

    pub fn requires(&self) -> Option<&Requirement> {
        self.requires.as_ref()
    }

    pub fn super_group(&self) -> Option<&Arc<SuperGroup>> {
        self.super_group.as_ref()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn sort_key(&self) -> SortKey {
        (self.ordering, self.name.clone(), self.sequence)
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.members.read().contains_key(key)
    }

    pub fn member(&self, key: &str) -> Option<Member> {
        self.members.read().get(key).cloned()
    }

    pub fn value(&self, key: &str) -> Option<Arc<Value>> {
        self.members
            .read()
            .get(key)
            .and_then(Member::as_value)
            .cloned()
    }

    /// Every member, sorted by (ordering, label, creation sequence)
    pub fn members(&self) -> Vec<Member> {
        let mut members: Vec<Member> = self.members.read().values().cloned().collect();
        members.sort_by_cached_key(Member::sort_key);
        members
    }

    /// Every value member, sorted
    pub fn values(&self) -> Vec<Arc<Value>> {
        self.members()
            .into_iter()
            .filter_map(|member| match member {
                Member::Value(value) => Some(value),
                Member::Group(_) => None,
            })
            .collect()
    }

    /// Nest `child` under this group
    pub fn add_subgroup(&self, child: Arc<Group>) {
        self.members
            .write()
            .insert(child.key().to_owned(), Member::Group(child));
    }

    /// Insert or replace a value in place
    pub(crate) fn insert_value(&self, value: Arc<Value>) {
        self.members
            .write()
            .insert(value.key().to_owned(), Member::Value(value));
    }

    /// Drop every member; breaks the group <-> value reference cycle
    pub(crate) fn clear(&self) {
        self.members.write().clear();
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("ordering", &self.ordering)
            .field("members", &self.members.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Group`]
pub struct GroupBuilder {
    key: String,
    name: Option<String>,
    ordering: i32,
    requires: Option<Arc<Value>>,
    requires_value: Option<Choice>,
    super_group: Option<Arc<SuperGroup>>,
}

impl GroupBuilder {
    fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
            ordering: 1,
            requires: None,
            requires_value: None,
            super_group: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn ordering(mut self, ordering: i32) -> Self {
        self.ordering = ordering;
        self
    }

    /// Default requirement inherited by member values that declare none
    pub fn requires(mut self, target: &Arc<Value>) -> Self {
        self.requires = Some(Arc::clone(target));
        self
    }

    /// Trigger choice for [`requires`](Self::requires); defaults to the group key
    pub fn requires_value(mut self, trigger: impl Into<Choice>) -> Self {
        self.requires_value = Some(trigger.into());
        self
    }

    pub fn super_group(mut self, super_group: &Arc<SuperGroup>) -> Self {
        self.super_group = Some(Arc::clone(super_group));
        self
    }

    pub fn build(self) -> Result<Arc<Group>, SettingsError> {
        validate_key("group", &self.key)?;

        let requires = self.requires.map(|target| {
            let trigger = self
                .requires_value
                .unwrap_or_else(|| Choice::from(self.key.as_str()));
            target.add_choice(trigger.clone());
            Requirement::new(target, trigger.key)
        });

        Ok(Arc::new(Group {
            key: self.key,
            name: self.name,
            ordering: self.ordering,
            requires,
            super_group: self.super_group,
            sequence: next_sequence(),
            members: RwLock::new(IndexMap::new()),
        }))
    }
}

/// Presentation-only aggregation of groups
#[derive(Debug)]
pub struct SuperGroup {
    name: String,
    ordering: i32,
    groups: RwLock<Vec<String>>,
}

impl SuperGroup {
    pub fn new(name: impl Into<String>, ordering: i32) -> Arc<SuperGroup> {
        Arc::new(SuperGroup {
            name: name.into(),
            ordering,
            groups: RwLock::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordering(&self) -> i32 {
        self.ordering
    }

    /// Append a group key unless already present
    pub fn append(&self, group_key: &str) {
        let mut groups = self.groups.write();
        if !groups.iter().any(|existing| existing == group_key) {
            groups.push(group_key.to_owned());
        }
    }

    pub fn group_keys(&self) -> Vec<String> {
        self.groups.read().clone()
    }

    pub(crate) fn clear(&self) {
        self.groups.write().clear();
    }
}
