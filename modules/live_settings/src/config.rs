//! Configuration for the live settings module

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Prefix of environment variables overriding configuration (`LIVE_SETTINGS_CACHE__TTL=5m`)
pub const ENV_PREFIX: &str = "LIVE_SETTINGS_";

/// Width of the bounded table's value column
pub const BOUNDED_COLUMN_LENGTH: u32 = 255;

/// Live settings configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Scope used when the scope resolver cannot name one
    #[serde(default = "default_scope")]
    pub default_scope: i64,

    /// Language used for localized values when none is active
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Maximum stored length in the bounded table, at most [`BOUNDED_COLUMN_LENGTH`]
    #[serde(default = "default_max_value_length")]
    pub max_value_length: usize,

    /// Database connection string (used by the CLI)
    #[serde(default)]
    pub database_url: Option<String>,

    /// Read cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Per-scope lockdown tables
    #[serde(default)]
    pub overrides: Vec<ScopeOverrideConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_scope: default_scope(),
            default_language: default_language(),
            max_value_length: default_max_value_length(),
            database_url: None,
            cache: CacheConfig::default(),
            overrides: Vec::new(),
        }
    }
}

impl Config {
    /// Load defaults, then the optional YAML file, then `LIVE_SETTINGS_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load live settings configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits the settings tables cannot hold
    pub fn validate(&self) -> Result<()> {
        let column = BOUNDED_COLUMN_LENGTH as usize;
        if self.max_value_length == 0 || self.max_value_length > column {
            anyhow::bail!(
                "max_value_length must be between 1 and {}, got {}",
                column,
                self.max_value_length
            );
        }
        Ok(())
    }
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Disable to read every value from the store
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entry lifetime; entries never expire when unset
    #[serde(default, with = "humantime_serde")]
    pub ttl: Option<Duration>,

    /// Upper bound on cached rows
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: None,
            max_entries: default_max_entries(),
        }
    }
}

/// Lockdown table for one scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeOverrideConfig {
    /// Scope the table applies to
    pub scope: i64,

    /// `false` serves this table instead of the store and makes updates no-ops
    #[serde(default = "default_true")]
    pub db: bool,

    /// group -> key -> stored string
    #[serde(default)]
    pub settings: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_scope() -> i64 {
    1
}

fn default_language() -> String {
    "en-us".to_owned()
}

fn default_max_value_length() -> usize {
    BOUNDED_COLUMN_LENGTH as usize
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    10_000
}
