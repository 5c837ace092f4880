//! Contract models for live settings
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models.

use chrono::TimeDelta;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

/// Scope (site / tenant) under which settings and overrides are partitioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub i64);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ScopeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Table a setting row lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageTable {
    /// Short values, bounded length column
    Bounded,
    /// Values that may exceed the bounded column
    Unbounded,
    /// Immutable row served from the deployment override table
    Override,
}

impl StorageTable {
    /// Tables that are actually backed by the store, in lookup order
    pub const PERSISTENT: [StorageTable; 2] = [StorageTable::Bounded, StorageTable::Unbounded];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageTable::Bounded => "settings",
            StorageTable::Unbounded => "long_settings",
            StorageTable::Override => "overrides",
        }
    }
}

/// Persisted setting row (stored string form)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingRow {
    /// Scope that owns the row
    pub scope: ScopeId,
    /// Group key
    pub group: String,
    /// Storage key (value key, plus a language suffix for localized values)
    pub key: String,
    /// Stored string representation
    pub value: String,
    /// Table the row was read from or is written to
    pub table: StorageTable,
}

impl SettingRow {
    pub fn new(
        scope: ScopeId,
        group: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        table: StorageTable,
    ) -> Self {
        Self {
            scope,
            group: group.into(),
            key: key.into(),
            value: value.into(),
            table,
        }
    }

    /// `group.key` identity used in errors and logs
    pub fn identity(&self) -> String {
        format!("{}.{}", self.group, self.key)
    }
}

impl fmt::Display for SettingRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} = {}", self.group, self.key, self.value)
    }
}

/// A `(key, label)` choice pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub key: String,
    pub label: String,
}

impl Choice {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

impl From<&str> for Choice {
    fn from(key: &str) -> Self {
        Self::new(key, key)
    }
}

impl From<String> for Choice {
    fn from(key: String) -> Self {
        Self {
            label: key.clone(),
            key,
        }
    }
}

impl From<(&str, &str)> for Choice {
    fn from((key, label): (&str, &str)) -> Self {
        Self::new(key, label)
    }
}

/// Entry of the link-time module catalog.
///
/// Host crates declare loadable modules with
/// `inventory::submit! { ModuleDescriptor::new("payment.dummy", "Dummy processor") }`.
#[derive(Debug, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Fully qualified, dot-separated module name
    pub name: &'static str,
    /// Human readable summary
    pub summary: &'static str,
}

impl ModuleDescriptor {
    pub const fn new(name: &'static str, summary: &'static str) -> Self {
        Self { name, summary }
    }
}

/// Native form of a module setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleHandle {
    /// No module configured
    Empty,
    /// Configured name did not resolve in the catalog
    Unresolved,
    /// Resolved catalog entry
    Loaded(&'static ModuleDescriptor),
}

impl ModuleHandle {
    pub fn name(&self) -> Option<&'static str> {
        match self {
            ModuleHandle::Loaded(descriptor) => Some(descriptor.name),
            _ => None,
        }
    }
}

/// Native (program-facing) representation of a setting value
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Duration(TimeDelta),
    Text(String),
    List(Vec<String>),
    Module(ModuleHandle),
}

impl NativeValue {
    /// String form written to the store
    pub fn to_stored(&self) -> String {
        match self {
            NativeValue::Bool(true) => "True".to_owned(),
            NativeValue::Bool(false) => "False".to_owned(),
            NativeValue::Int(n) => n.to_string(),
            NativeValue::Float(f) => format_float(*f),
            NativeValue::Decimal(d) => d.to_string(),
            NativeValue::Duration(d) => format_seconds(*d),
            NativeValue::Text(s) => s.clone(),
            NativeValue::List(items) => {
                serde_json::to_string(items).unwrap_or_else(|_| "[]".to_owned())
            }
            NativeValue::Module(handle) => handle.name().unwrap_or_default().to_owned(),
        }
    }

    /// Truthiness used by visibility checks against dependencies without choices
    pub fn is_truthy(&self) -> bool {
        match self {
            NativeValue::Bool(b) => *b,
            NativeValue::Int(n) => *n != 0,
            NativeValue::Float(f) => *f != 0.0,
            NativeValue::Decimal(d) => !d.is_zero(),
            NativeValue::Duration(d) => !d.is_zero(),
            NativeValue::Text(s) => !s.is_empty(),
            NativeValue::List(items) => !items.is_empty(),
            NativeValue::Module(handle) => matches!(handle, ModuleHandle::Loaded(_)),
        }
    }

    /// Whether `trigger` is currently selected: membership for lists, equality otherwise
    pub fn selects(&self, trigger: &str) -> bool {
        match self {
            NativeValue::List(items) => items.iter().any(|item| item == trigger),
            NativeValue::Text(s) => s == trigger,
            other => other.to_stored() == trigger,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NativeValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            NativeValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            NativeValue::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            NativeValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<ModuleHandle> {
        match self {
            NativeValue::Module(handle) => Some(*handle),
            _ => None,
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_stored())
    }
}

/// Floats keep a fractional part so `2.0` does not read back as an integer literal
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

/// Total seconds as a float string, e.g. `90061.0` or `1.5`
fn format_seconds(d: TimeDelta) -> String {
    let secs = d.num_seconds();
    let micros = i64::from(d.subsec_nanos() / 1_000);
    if micros == 0 {
        format!("{secs}.0")
    } else {
        (secs as f64 + micros as f64 / 1_000_000.0).to_string()
    }
}

impl From<bool> for NativeValue {
    fn from(b: bool) -> Self {
        NativeValue::Bool(b)
    }
}

impl From<i64> for NativeValue {
    fn from(n: i64) -> Self {
        NativeValue::Int(n)
    }
}

impl From<i32> for NativeValue {
    fn from(n: i32) -> Self {
        NativeValue::Int(i64::from(n))
    }
}

impl From<f64> for NativeValue {
    fn from(f: f64) -> Self {
        NativeValue::Float(f)
    }
}

impl From<Decimal> for NativeValue {
    fn from(d: Decimal) -> Self {
        NativeValue::Decimal(d)
    }
}

impl From<TimeDelta> for NativeValue {
    fn from(d: TimeDelta) -> Self {
        NativeValue::Duration(d)
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::Text(s.to_owned())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::Text(s)
    }
}

impl From<Vec<String>> for NativeValue {
    fn from(items: Vec<String>) -> Self {
        NativeValue::List(items)
    }
}

impl From<Vec<&str>> for NativeValue {
    fn from(items: Vec<&str>) -> Self {
        NativeValue::List(items.into_iter().map(str::to_owned).collect())
    }
}

impl From<ModuleHandle> for NativeValue {
    fn from(handle: ModuleHandle) -> Self {
        NativeValue::Module(handle)
    }
}

/// Snapshot of every persisted row: scope -> group -> key -> stored string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsExport {
    pub scopes: BTreeMap<ScopeId, BTreeMap<String, BTreeMap<String, String>>>,
}

impl SettingsExport {
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Stored value for `(scope, group, key)`, if exported
    pub fn get(&self, scope: ScopeId, group: &str, key: &str) -> Option<&str> {
        self.scopes
            .get(&scope)
            .and_then(|groups| groups.get(group))
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
    }
}
