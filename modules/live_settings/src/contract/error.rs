//! Contract error types for live settings
//!
//! These errors are transport-agnostic and used for inter-module communication.

use thiserror::Error;

/// Live settings domain errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// Nothing registered under the identity, or override mode without entry and default
    #[error("Configuration setting not found: {identity}")]
    ConfigNotFound {
        /// `group.key`
        identity: String,
    },
    /// No override, no persisted row and no default
    #[error("Setting has no value: {identity}")]
    ValueUnset {
        /// `group.key`
        identity: String,
    },
    /// Stored or submitted text does not convert to the value's kind
    #[error("Cannot convert '{raw}' for {identity}: {reason}")]
    Coercion {
        identity: String,
        raw: String,
        reason: String,
    },
    /// Invalid key, value too long for its table, etc.
    #[error("Validation error: {message}")]
    Validation { message: String },
    /// The store could not be reached outside the startup window
    #[error("Settings store unavailable while reading {identity}: {details}")]
    StoreUnavailable { identity: String, details: String },
    /// A setting without default was read before the store schema exists
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    /// Backend failure outside the taxonomy above
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SettingsError {
    pub fn not_found(group: &str, key: &str) -> Self {
        Self::ConfigNotFound {
            identity: format!("{group}.{key}"),
        }
    }

    pub fn unset(identity: impl Into<String>) -> Self {
        Self::ValueUnset {
            identity: identity.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Lookup misses and unset values, i.e. errors a safe accessor may swallow
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ValueUnset { .. } | Self::Configuration { .. }
        )
    }
}

/// Failures reported by a settings store adapter
#[derive(Debug, Error)]
pub enum StoreError {
    /// The table does not exist yet (migrations have not run)
    #[error("table '{table}' does not exist")]
    SchemaMissing { table: String },
    /// Any other backend failure
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_schema_missing(&self) -> bool {
        matches!(self, Self::SchemaMissing { .. })
    }
}
