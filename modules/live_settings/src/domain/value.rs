//! Registered setting values

use super::group::Group;
use super::kind::ValueKind;
use super::validation::{format_setting_name, validate_key};
use super::visibility::Requirement;
use crate::contract::{Choice, NativeValue, SettingsError};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Process-wide creation counter shared by values and groups
pub(crate) fn next_sequence() -> u64 {
    NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// Callback run on every change: `(old, new) -> value to persist`
pub type UpdateCallback = Arc<dyn Fn(&NativeValue, NativeValue) -> NativeValue + Send + Sync>;

/// Sort key shared by values and groups: (ordering, label, creation sequence)
pub type SortKey = (i32, Option<String>, u64);

/// One typed configuration entry
pub struct Value {
    group: Arc<Group>,
    key: String,
    kind: ValueKind,
    description: Option<String>,
    help_text: Option<String>,
    choices: RwLock<Vec<Choice>>,
    ordering: i32,
    hidden: bool,
    localized: bool,
    default: Option<NativeValue>,
    update_callback: Option<UpdateCallback>,
    requires: Option<Requirement>,
    sequence: u64,
}

impl Value {
    pub fn builder(group: &Arc<Group>, key: impl Into<String>, kind: ValueKind) -> ValueBuilder {
        ValueBuilder::new(group, key, kind)
    }

    pub fn group(&self) -> &Arc<Group> {
        &self.group
    }

    pub fn group_key(&self) -> &str {
        self.group.key()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// `group.key`
    pub fn identity(&self) -> String {
        format!("{}.{}", self.group.key(), self.key)
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    pub fn ordering(&self) -> i32 {
        self.ordering
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_localized(&self) -> bool {
        self.localized
    }

    pub fn default(&self) -> Option<&NativeValue> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Declared default, or the kind's type default
    pub fn effective_default(&self) -> NativeValue {
        self.default
            .clone()
            .unwrap_or_else(|| self.kind.type_default())
    }

    pub fn update_callback(&self) -> Option<&UpdateCallback> {
        self.update_callback.as_ref()
    }

    pub fn requires(&self) -> Option<&Requirement> {
        self.requires.as_ref()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn choices(&self) -> Vec<Choice> {
        self.choices.read().clone()
    }

    pub fn has_choices(&self) -> bool {
        !self.choices.read().is_empty()
    }

    /// Append a choice unless its key already exists; returns whether it was added
    pub fn add_choice(&self, choice: impl Into<Choice>) -> bool {
        if !self.kind.accepts_choices() {
            return false;
        }
        let choice = choice.into();
        let mut choices = self.choices.write();
        if choices.iter().any(|existing| existing.key == choice.key) {
            return false;
        }
        choices.push(choice);
        true
    }

    /// Key used in the store: the value key, suffixed with the language for localized values
    pub fn storage_key(&self, language: &str) -> String {
        if self.localized {
            format!("{}_{}", self.key, format_setting_name(language))
        } else {
            self.key.clone()
        }
    }

    pub fn sort_key(&self) -> SortKey {
        (self.ordering, self.description.clone(), self.sequence)
    }

    /// Editor note describing the declared default
    pub fn default_text(&self) -> String {
        let Some(default) = &self.default else {
            return String::new();
        };
        if default.to_stored().is_empty() {
            return "Default value: \"\"".to_owned();
        }
        let choices = self.choices.read();
        if choices.is_empty() {
            return format!("Default value: {}", default);
        }
        let labels: Vec<&str> = choices
            .iter()
            .filter(|choice| default.selects(&choice.key))
            .map(|choice| choice.label.as_str())
            .collect();
        format!("Default value: {}", labels.join(", "))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("identity", &self.identity())
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("ordering", &self.ordering)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Builder for [`Value`]
pub struct ValueBuilder {
    group: Arc<Group>,
    key: String,
    kind: ValueKind,
    description: Option<String>,
    help_text: Option<String>,
    choices: Vec<Choice>,
    ordering: i32,
    hidden: bool,
    localized: bool,
    default: Option<NativeValue>,
    update_callback: Option<UpdateCallback>,
    requires: Option<Arc<Value>>,
    requires_value: Option<Choice>,
}

impl ValueBuilder {
    fn new(group: &Arc<Group>, key: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            group: Arc::clone(group),
            key: key.into(),
            kind,
            description: None,
            help_text: None,
            choices: Vec::new(),
            ordering: 0,
            hidden: false,
            localized: false,
            default: None,
            update_callback: None,
            requires: None,
            requires_value: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    pub fn choice(mut self, choice: impl Into<Choice>) -> Self {
        self.choices.push(choice.into());
        self
    }

    pub fn choices<C: Into<Choice>>(mut self, choices: impl IntoIterator<Item = C>) -> Self {
        self.choices.extend(choices.into_iter().map(Into::into));
        self
    }

    pub fn ordering(mut self, ordering: i32) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn localized(mut self, localized: bool) -> Self {
        self.localized = localized;
        self
    }

    pub fn default(mut self, default: impl Into<NativeValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn update_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&NativeValue, NativeValue) -> NativeValue + Send + Sync + 'static,
    {
        self.update_callback = Some(Arc::new(callback));
        self
    }

    /// Only show this value when `target` is truthy, or selects the trigger when it has choices
    pub fn requires(mut self, target: &Arc<Value>) -> Self {
        self.requires = Some(Arc::clone(target));
        self
    }

    /// Trigger choice for [`requires`](Self::requires); defaults to this value's key
    pub fn requires_value(mut self, trigger: impl Into<Choice>) -> Self {
        self.requires_value = Some(trigger.into());
        self
    }

    pub fn build(self) -> Result<Value, SettingsError> {
        validate_key("value", &self.key)?;
        let identity = format!("{}.{}", self.group.key(), self.key);

        let default = self
            .default
            .map(|default| {
                self.kind
                    .coerce(default)
                    .map_err(|err| SettingsError::Coercion {
                        identity: identity.clone(),
                        raw: err.raw,
                        reason: err.reason,
                    })
            })
            .transpose()?;

        let mut choices: Vec<Choice> = Vec::new();
        if self.kind.accepts_choices() {
            for choice in self.choices {
                if !choices.iter().any(|existing| existing.key == choice.key) {
                    choices.push(choice);
                }
            }
        }

        let requires = match self.requires {
            Some(target) => {
                let trigger = self
                    .requires_value
                    .unwrap_or_else(|| Choice::from(self.key.as_str()));
                target.add_choice(trigger.clone());
                Some(Requirement::new(target, trigger.key))
            }
            None => self.group.requires().cloned(),
        };

        Ok(Value {
            group: self.group,
            key: self.key,
            kind: self.kind,
            description: self.description,
            help_text: self.help_text,
            choices: RwLock::new(choices),
            ordering: self.ordering,
            hidden: self.hidden,
            localized: self.localized,
            default,
            update_callback: self.update_callback,
            requires,
            sequence: next_sequence(),
        })
    }
}
