//! Read caches for setting rows

pub mod memory;

pub use memory::{InMemorySettingsCache, NoOpSettingsCache};

use crate::config::CacheConfig;
use crate::domain::repository::SettingsCache;
use std::sync::Arc;

/// Build the cache described by the configuration
pub fn from_config(config: &CacheConfig) -> Arc<dyn SettingsCache> {
    if config.enabled {
        Arc::new(InMemorySettingsCache::new(config.ttl, config.max_entries))
    } else {
        tracing::debug!("Settings cache disabled");
        Arc::new(NoOpSettingsCache)
    }
}
