//! Value kinds and coercion between stored strings and native values

use crate::contract::{Choice, ModuleHandle, NativeValue, StorageTable};
use crate::domain::modules::find_module;
use chrono::TimeDelta;
use rust_decimal::Decimal;
use std::str::FromStr;
use url::Url;

/// Closed set of setting kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    /// Integer constrained to `>= 0`
    PositiveInteger,
    Float,
    Decimal,
    /// Stored as total seconds
    Duration,
    String,
    /// Text that may exceed the bounded column
    LongString,
    /// Ordered list of strings stored as a JSON array
    MultipleString,
    LongMultipleString,
    /// With `render_value == false` the editor never shows the current password;
    /// submitting `""` keeps it and `" "` clears it.
    Password { render_value: bool },
    /// Name of an entry in the link-time module catalog
    Module,
    /// Absolute `http`, `https`, `ftp` or `ftps` URL; a missing scheme means `http://`
    Url,
}

/// Conversion failure, without the identity of the setting
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct CoerceError {
    pub raw: String,
    pub reason: String,
}

impl CoerceError {
    fn new(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.to_owned(),
            reason: reason.into(),
        }
    }
}

const CHECKBOX_ON: [&str; 4] = ["on", "true", "1", "t"];

const URL_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::PositiveInteger => "positive_integer",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::Duration => "duration",
            ValueKind::String => "string",
            ValueKind::LongString => "long_string",
            ValueKind::MultipleString => "multiple_string",
            ValueKind::LongMultipleString => "long_multiple_string",
            ValueKind::Password { .. } => "password",
            ValueKind::Module => "module",
            ValueKind::Url => "url",
        }
    }

    /// Table rows of this kind are written to
    pub fn storage_table(self) -> StorageTable {
        match self {
            ValueKind::LongString | ValueKind::LongMultipleString => StorageTable::Unbounded,
            _ => StorageTable::Bounded,
        }
    }

    /// Booleans silently ignore added choices
    pub fn accepts_choices(self) -> bool {
        !matches!(self, ValueKind::Boolean)
    }

    pub fn is_multiple(self) -> bool {
        matches!(
            self,
            ValueKind::MultipleString | ValueKind::LongMultipleString
        )
    }

    /// Native value the unset state coerces to
    pub fn type_default(self) -> NativeValue {
        match self {
            ValueKind::Boolean => NativeValue::Bool(false),
            ValueKind::Integer | ValueKind::PositiveInteger => NativeValue::Int(0),
            ValueKind::Float => NativeValue::Float(0.0),
            ValueKind::Decimal => NativeValue::Decimal(Decimal::ZERO),
            ValueKind::Duration => NativeValue::Duration(TimeDelta::zero()),
            ValueKind::String
            | ValueKind::LongString
            | ValueKind::Password { .. }
            | ValueKind::Url => NativeValue::Text(String::new()),
            ValueKind::MultipleString | ValueKind::LongMultipleString => {
                NativeValue::List(Vec::new())
            }
            ValueKind::Module => NativeValue::Module(ModuleHandle::Empty),
        }
    }

    /// Parse the stored string form
    pub fn from_stored(self, raw: &str) -> Result<NativeValue, CoerceError> {
        match self {
            ValueKind::Boolean => Ok(NativeValue::Bool(matches!(raw, "True" | "t" | "1"))),
            ValueKind::Integer => parse_integer(raw).map(NativeValue::Int),
            ValueKind::PositiveInteger => {
                let n = parse_integer(raw)?;
                if n < 0 {
                    return Err(CoerceError::new(
                        raw,
                        "Ensure this value is greater than or equal to 0.",
                    ));
                }
                Ok(NativeValue::Int(n))
            }
            ValueKind::Float => {
                if raw.trim().is_empty() {
                    return Ok(NativeValue::Float(0.0));
                }
                raw.trim()
                    .parse::<f64>()
                    .map(NativeValue::Float)
                    .map_err(|_| CoerceError::new(raw, "Enter a number."))
            }
            ValueKind::Decimal => {
                if raw.trim().is_empty() {
                    return Ok(NativeValue::Decimal(Decimal::ZERO));
                }
                Decimal::from_str(raw.trim())
                    .or_else(|_| Decimal::from_scientific(raw.trim()))
                    .map(NativeValue::Decimal)
                    .map_err(|_| CoerceError::new(raw, "Enter a number."))
            }
            ValueKind::Duration => parse_seconds(raw).map(NativeValue::Duration),
            ValueKind::String
            | ValueKind::LongString
            | ValueKind::Password { .. }
            | ValueKind::Url => Ok(NativeValue::Text(raw.to_owned())),
            ValueKind::MultipleString | ValueKind::LongMultipleString => {
                Ok(NativeValue::List(parse_list(raw)))
            }
            ValueKind::Module => Ok(NativeValue::Module(resolve_module(raw))),
        }
    }

    /// Bring an arbitrary native value into this kind's native form
    pub fn coerce(self, value: NativeValue) -> Result<NativeValue, CoerceError> {
        match (self, value) {
            (ValueKind::Boolean, v @ NativeValue::Bool(_)) => Ok(v),
            (ValueKind::Integer, v @ NativeValue::Int(_)) => Ok(v),
            (ValueKind::PositiveInteger, NativeValue::Int(n)) if n < 0 => Err(CoerceError::new(
                &n.to_string(),
                "Ensure this value is greater than or equal to 0.",
            )),
            (ValueKind::PositiveInteger, v @ NativeValue::Int(_)) => Ok(v),
            (ValueKind::Float, v @ NativeValue::Float(_)) => Ok(v),
            (ValueKind::Float, NativeValue::Int(n)) => Ok(NativeValue::Float(n as f64)),
            (ValueKind::Decimal, v @ NativeValue::Decimal(_)) => Ok(v),
            (ValueKind::Decimal, NativeValue::Int(n)) => Ok(NativeValue::Decimal(Decimal::from(n))),
            (ValueKind::Duration, v @ NativeValue::Duration(_)) => Ok(v),
            (
                ValueKind::String | ValueKind::LongString | ValueKind::Password { .. },
                v @ NativeValue::Text(_),
            ) => Ok(v),
            (ValueKind::MultipleString | ValueKind::LongMultipleString, v @ NativeValue::List(_)) => {
                Ok(v)
            }
            (ValueKind::Module, NativeValue::Module(ModuleHandle::Unresolved)) => {
                Err(CoerceError::new("", "Unresolved module reference."))
            }
            (ValueKind::Module, v @ NativeValue::Module(_)) => Ok(v),
            // Stored rows resolve leniently; new values must name a catalog entry
            (ValueKind::Module, NativeValue::Text(name))
                if !name.is_empty() && find_module(&name).is_none() =>
            {
                Err(CoerceError::new(&name, format!("No module named {name}.")))
            }
            (ValueKind::Url, other) => parse_url(&other.to_stored()),
            (kind, other) => kind.from_stored(&other.to_stored()),
        }
    }

    /// Parse submitted form input. `inputs` holds every submitted string for the field
    /// (several for multi-selects, none for an unchecked checkbox).
    pub fn parse_input(
        self,
        inputs: &[String],
        choices: &[Choice],
    ) -> Result<NativeValue, CoerceError> {
        let first = inputs.first().map(String::as_str).unwrap_or("");
        match self {
            ValueKind::Boolean => Ok(NativeValue::Bool(
                CHECKBOX_ON.contains(&first.to_ascii_lowercase().as_str()),
            )),
            kind if kind.is_multiple() && !choices.is_empty() => {
                for item in inputs {
                    check_choice(item, choices)?;
                }
                Ok(NativeValue::List(inputs.to_vec()))
            }
            kind => {
                if !choices.is_empty() && !first.is_empty() && !kind.is_multiple() {
                    check_choice(first, choices)?;
                }
                if matches!(kind, ValueKind::Module | ValueKind::Url) {
                    return kind.coerce(NativeValue::Text(first.to_owned()));
                }
                kind.from_stored(first)
            }
        }
    }

    /// Password no-re-display semantics: `""` keeps the current value, `" "` clears it
    pub fn adjust_update(self, current: &NativeValue, new: NativeValue) -> NativeValue {
        match (self, new.as_str()) {
            (ValueKind::Password { render_value: false }, Some("")) => current.clone(),
            (ValueKind::Password { render_value: false }, Some(" ")) => {
                NativeValue::Text(String::new())
            }
            _ => new,
        }
    }

    /// Editor display form of a native value
    pub fn to_editor(self, value: &NativeValue) -> String {
        match (self, value) {
            (ValueKind::Password { render_value: false }, _) => String::new(),
            _ => value.to_stored(),
        }
    }
}

fn check_choice(item: &str, choices: &[Choice]) -> Result<(), CoerceError> {
    if choices.iter().any(|choice| choice.key == item) {
        Ok(())
    } else {
        Err(CoerceError::new(
            item,
            format!("Select a valid choice. {item} is not one of the available choices."),
        ))
    }
}

fn parse_integer(raw: &str) -> Result<i64, CoerceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| CoerceError::new(raw, "Enter a whole number."))
}

fn parse_seconds(raw: &str) -> Result<TimeDelta, CoerceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(TimeDelta::zero());
    }
    let seconds: f64 = trimmed
        .parse()
        .map_err(|_| CoerceError::new(raw, "This value must be a real number."))?;
    let micros = (seconds * 1_000_000.0).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return Err(CoerceError::new(
            raw,
            format!(
                "The maximum allowed value is {} seconds",
                i64::MAX / 1_000_000
            ),
        ));
    }
    Ok(TimeDelta::microseconds(micros as i64))
}

fn parse_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Ok(serde_json::Value::String(s)) => vec![s],
        _ => vec![raw.to_owned()],
    }
}

fn parse_url(raw: &str) -> Result<NativeValue, CoerceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(NativeValue::Text(String::new()));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}")
    };
    match Url::parse(&candidate) {
        Ok(url)
            if URL_SCHEMES.contains(&url.scheme())
                && url.host_str().is_some_and(|host| !host.is_empty()) =>
        {
            Ok(NativeValue::Text(candidate))
        }
        _ => Err(CoerceError::new(raw, "Enter a valid URL.")),
    }
}

fn resolve_module(raw: &str) -> ModuleHandle {
    if raw.is_empty() {
        return ModuleHandle::Empty;
    }
    match find_module(raw) {
        Some(descriptor) => ModuleHandle::Loaded(descriptor),
        None => {
            tracing::warn!(module = raw, "Configured module is not in the catalog");
            ModuleHandle::Unresolved
        }
    }
}
