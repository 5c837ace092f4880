//! Native client trait for inter-module communication
//!
//! This trait defines the API that other modules use to read and write live settings.
//! NO HTTP - direct function calls for performance.

use super::{
    error::SettingsError,
    model::{Choice, NativeValue, SettingsExport},
};
use async_trait::async_trait;

/// Live settings API for inter-module communication
#[async_trait]
pub trait SettingsApi: Send + Sync {
    // ===== Reads =====

    /// Current native value of `group.key`
    async fn config_value(&self, group: &str, key: &str) -> Result<NativeValue, SettingsError>;

    /// Current native value, or `default` when the setting is missing or unset
    async fn config_value_or(
        &self,
        group: &str,
        key: &str,
        default: NativeValue,
    ) -> Result<NativeValue, SettingsError>;

    /// Whether `group.key` is registered
    async fn config_exists(&self, group: &str, key: &str) -> bool;

    /// Read a list of group keys from `group.groupkey`, then `key` from each of those groups
    async fn config_collect_values(
        &self,
        group: &str,
        groupkey: &str,
        key: &str,
        unique: bool,
        skip_missing: bool,
    ) -> Result<Vec<NativeValue>, SettingsError>;

    /// Choices of `group.key` whose key is currently selected
    async fn config_choice_values(
        &self,
        group: &str,
        key: &str,
        skip_missing: bool,
    ) -> Result<Vec<Choice>, SettingsError>;

    // ===== Writes =====

    /// Update `group.key`; returns whether anything changed
    async fn update_value(
        &self,
        group: &str,
        key: &str,
        value: NativeValue,
    ) -> Result<bool, SettingsError>;

    /// Add a choice to `group.key`, or pre-register it if the value is not registered yet
    async fn add_choice(&self, group: &str, key: &str, choice: Choice)
        -> Result<(), SettingsError>;

    // ===== Export =====

    /// Snapshot of every persisted row
    async fn export(&self) -> Result<SettingsExport, SettingsError>;
}
