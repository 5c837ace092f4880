//! Settings editor: form field descriptors and atomic form submission

use super::kind::ValueKind;
use super::service::{PendingUpdate, Service};
use super::validation::FIELD_SEPARATOR;
use super::value::Value;
use crate::contract::{Choice, SettingsError};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Input widget a field renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Checkbox,
    Text,
    Textarea,
    Password { render_value: bool },
    Select,
    MultiSelect,
    Hidden,
    MultipleHidden,
}

/// Everything a form renderer needs for one value
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Form field name, `GROUP__KEY`
    pub name: String,
    pub group: String,
    pub key: String,
    pub widget: Widget,
    pub label: String,
    pub help_text: Option<String>,
    /// Current editor representation
    pub initial: String,
    /// Note describing the declared default
    pub default_text: String,
    pub choices: Vec<Choice>,
}

/// Submitted form data: field name -> every submitted string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    fields: BTreeMap<String, Vec<String>>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs; repeated names accumulate (multi-selects)
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut submission = Self::new();
        for (name, value) in pairs {
            submission.insert(name, value);
        }
        submission
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    /// Submitted strings for a field; empty when the field was not submitted
    pub fn get(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Result of an accepted submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// `group.key` of every changed value
    pub updated: Vec<String>,
    /// `Updated KEY on GROUP` per change
    pub messages: Vec<String>,
}

/// Rejected submission with one message per failing field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("settings form rejected: {} invalid field(s)", errors.len())]
pub struct SubmissionRejected {
    pub errors: BTreeMap<String, String>,
}

/// Form over the enabled values of the whole registry or of one group
pub struct SettingsEditor {
    service: Arc<Service>,
    values: Vec<Arc<Value>>,
}

impl SettingsEditor {
    /// Every enabled value of every enabled group
    pub async fn for_registry(service: Arc<Service>) -> Self {
        let mut values = Vec::new();
        for group in service.registry().groups() {
            if !service.group_enabled(&group).await {
                continue;
            }
            for member in service.enabled_members(&group).await {
                if let Some(value) = member.as_value() {
                    values.push(Arc::clone(value));
                }
            }
        }
        Self { service, values }
    }

    /// Enabled values of one group
    pub async fn for_group(service: Arc<Service>, group: &str) -> Result<Self, SettingsError> {
        let group = service.config_get_group(group)?;
        let values = service
            .enabled_members(&group)
            .await
            .iter()
            .filter_map(|member| member.as_value().cloned())
            .collect();
        Ok(Self { service, values })
    }

    /// Field name of a value: `GROUP__KEY`
    pub fn field_name(value: &Value) -> String {
        format!("{}{}{}", value.group_key(), FIELD_SEPARATOR, value.key())
    }

    /// In override mode the form shows values but never applies changes
    pub fn is_read_only(&self) -> bool {
        !self.service.is_db_enabled()
    }

    pub fn values(&self) -> &[Arc<Value>] {
        &self.values
    }

    pub async fn fields(&self) -> Result<Vec<FieldSpec>, SettingsError> {
        let mut fields = Vec::with_capacity(self.values.len());
        for value in &self.values {
            fields.push(self.field_spec(value).await?);
        }
        Ok(fields)
    }

    pub async fn field_spec(&self, value: &Value) -> Result<FieldSpec, SettingsError> {
        let choices = value.choices();
        Ok(FieldSpec {
            name: Self::field_name(value),
            group: value.group_key().to_owned(),
            key: value.key().to_owned(),
            widget: widget_for(value.kind(), !choices.is_empty(), value.is_hidden()),
            label: value.description().unwrap_or(value.key()).to_owned(),
            help_text: value.help_text().map(str::to_owned),
            initial: self.initial_value(value).await?,
            default_text: value.default_text(),
            choices,
        })
    }

    /// Locked scopes render values missing from the override table as empty
    async fn initial_value(&self, value: &Value) -> Result<String, SettingsError> {
        match self.service.editor_value(value).await {
            Err(e) if e.is_missing() && self.is_read_only() => Ok(String::new()),
            other => other,
        }
    }

    /// Parse and check every field first; write only when all of them pass.
    ///
    /// A store failure while writing stops the submission and is reported against the
    /// field that failed; fields written before it stay written.
    pub async fn submit(
        &self,
        submission: &Submission,
    ) -> Result<SubmissionOutcome, SubmissionRejected> {
        if self.is_read_only() {
            tracing::debug!("Settings form submitted in override mode, nothing applied");
            return Ok(SubmissionOutcome::default());
        }

        let mut pending: Vec<(&Arc<Value>, PendingUpdate)> = Vec::with_capacity(self.values.len());
        let mut errors = BTreeMap::new();
        for value in &self.values {
            let name = Self::field_name(value);
            let native = match value
                .kind()
                .parse_input(submission.get(&name), &value.choices())
            {
                Ok(native) => native,
                Err(e) => {
                    errors.insert(name, e.reason);
                    continue;
                }
            };
            match self.service.prepare_update(value, native).await {
                Ok(Some(update)) => pending.push((value, update)),
                Ok(None) => {}
                Err(e) => {
                    errors.insert(name, e.to_string());
                }
            }
        }
        if !errors.is_empty() {
            return Err(SubmissionRejected { errors });
        }

        let mut outcome = SubmissionOutcome::default();
        for (value, update) in pending {
            if let Err(e) = self.service.apply_update(update).await {
                let mut errors = BTreeMap::new();
                errors.insert(Self::field_name(value), e.to_string());
                return Err(SubmissionRejected { errors });
            }
            outcome.updated.push(value.identity());
            outcome
                .messages
                .push(format!("Updated {} on {}", value.key(), value.group_key()));
        }
        Ok(outcome)
    }
}

fn widget_for(kind: ValueKind, has_choices: bool, hidden: bool) -> Widget {
    match (has_choices, hidden) {
        (true, true) => Widget::MultipleHidden,
        (true, false) if kind.is_multiple() => Widget::MultiSelect,
        (true, false) => Widget::Select,
        (false, true) => Widget::Hidden,
        (false, false) => match kind {
            ValueKind::Boolean => Widget::Checkbox,
            ValueKind::LongString | ValueKind::LongMultipleString => Widget::Textarea,
            ValueKind::Password { render_value } => Widget::Password { render_value },
            _ => Widget::Text,
        },
    }
}
