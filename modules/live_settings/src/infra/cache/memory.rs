//! In-memory cache with optional expiry

use crate::contract::SettingRow;
use crate::domain::repository::SettingsCache;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    row: Option<SettingRow>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(row: Option<SettingRow>, ttl: Option<Duration>) -> Self {
        Self {
            row,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }
}

/// Process-wide cache of rows and misses, keyed by `Setting::{scope}::{group}::{key}`
pub struct InMemorySettingsCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Option<Duration>,
    max_entries: usize,
}

impl InMemorySettingsCache {
    pub fn new(ttl: Option<Duration>, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries; when still full, start over
    fn make_room(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
        if self.entries.len() >= self.max_entries {
            tracing::debug!(
                entries = self.entries.len(),
                "Settings cache full, clearing"
            );
            self.entries.clear();
        }
    }
}

#[async_trait]
impl SettingsCache for InMemorySettingsCache {
    async fn get(&self, key: &str) -> Option<Option<SettingRow>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Some(entry.row.clone());
            }
        }
        // Guard released above; removing while holding it would deadlock the shard
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        None
    }

    async fn set(&self, key: &str, row: Option<SettingRow>) {
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.make_room();
        }
        self.entries
            .insert(key.to_owned(), CacheEntry::new(row, self.ttl));
    }

    async fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    async fn clear(&self) {
        self.entries.clear();
    }
}

/// Cache that never holds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSettingsCache;

#[async_trait]
impl SettingsCache for NoOpSettingsCache {
    async fn get(&self, _key: &str) -> Option<Option<SettingRow>> {
        None
    }

    async fn set(&self, _key: &str, _row: Option<SettingRow>) {}

    async fn delete(&self, _key: &str) {}

    async fn clear(&self) {}
}
