//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{Choice, NativeValue, SettingsApi, SettingsError, SettingsExport};
use crate::domain::Service;
use async_trait::async_trait;
use std::sync::Arc;

/// Native client implementation that directly calls the domain service
///
/// Handed out by [`LiveSettingsModule::client`](crate::LiveSettingsModule::client)
/// to code that only needs the read/write surface.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SettingsApi for NativeClient {
    async fn config_value(&self, group: &str, key: &str) -> Result<NativeValue, SettingsError> {
        self.service.config_value(group, key).await
    }

    async fn config_value_or(
        &self,
        group: &str,
        key: &str,
        default: NativeValue,
    ) -> Result<NativeValue, SettingsError> {
        self.service.config_value_or(group, key, default).await
    }

    async fn config_exists(&self, group: &str, key: &str) -> bool {
        self.service.config_exists(group, key)
    }

    async fn config_collect_values(
        &self,
        group: &str,
        groupkey: &str,
        key: &str,
        unique: bool,
        skip_missing: bool,
    ) -> Result<Vec<NativeValue>, SettingsError> {
        self.service
            .config_collect_values(group, groupkey, key, unique, skip_missing)
            .await
    }

    async fn config_choice_values(
        &self,
        group: &str,
        key: &str,
        skip_missing: bool,
    ) -> Result<Vec<Choice>, SettingsError> {
        self.service
            .config_choice_values(group, key, skip_missing)
            .await
    }

    async fn update_value(
        &self,
        group: &str,
        key: &str,
        value: NativeValue,
    ) -> Result<bool, SettingsError> {
        let target = self.service.config_get(group, key)?;
        self.service.update(&target, value).await
    }

    async fn add_choice(
        &self,
        group: &str,
        key: &str,
        choice: Choice,
    ) -> Result<(), SettingsError> {
        self.service.config_add_choice(group, key, choice);
        Ok(())
    }

    async fn export(&self) -> Result<SettingsExport, SettingsError> {
        self.service.export().await
    }
}
