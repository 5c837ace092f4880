//! Live Settings
//!
//! Registry of typed, grouped runtime settings. Values declare a kind, a default
//! and optional dependencies; current values are read from a per-scope store
//! behind a read cache, and deployments can pin or lock values per scope through
//! an override table in the configuration file.

// Public exports
pub mod contract;
pub use contract::{
    client::SettingsApi, error::SettingsError, Choice, ModuleDescriptor, ModuleHandle,
    NativeValue, ScopeId, SettingRow, SettingsExport, StorageTable,
};

pub mod module;
pub use module::LiveSettingsModule;

pub mod config;
pub use config::Config;

pub mod domain;
pub use domain::{Group, Registry, Service, SettingsEditor, SuperGroup, Value, ValueKind};

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod infra;

/// Re-exported so hosts can declare module descriptors without a direct dependency
pub use inventory;
