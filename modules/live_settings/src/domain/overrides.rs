//! Per-scope lockdown tables loaded from deployment configuration

use crate::config::ScopeOverrideConfig;
use crate::contract::ScopeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// group -> key -> stored string
pub type OverrideTable = BTreeMap<String, BTreeMap<String, String>>;

/// Outcome of [`OverrideLayer::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOverrides {
    /// Whether the persistent store is consulted for this scope
    pub db_allowed: bool,
    /// Entries for this scope; empty when none are configured
    pub table: Arc<OverrideTable>,
}

impl ResolvedOverrides {
    /// Stored string for `(group, key)`, if the table lists it
    pub fn entry(&self, group: &str, key: &str) -> Option<&str> {
        self.table
            .get(group)
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct ScopeOverrides {
    db: bool,
    table: Arc<OverrideTable>,
}

/// All configured lockdown tables, keyed by scope
#[derive(Debug, Clone, Default)]
pub struct OverrideLayer {
    scopes: HashMap<ScopeId, ScopeOverrides>,
    empty: Arc<OverrideTable>,
}

impl OverrideLayer {
    /// Build from configuration; a later entry for the same scope replaces an earlier one
    pub fn from_config(entries: &[ScopeOverrideConfig]) -> Self {
        let scopes = entries
            .iter()
            .map(|entry| {
                (
                    ScopeId(entry.scope),
                    ScopeOverrides {
                        db: entry.db,
                        table: Arc::new(entry.settings.clone()),
                    },
                )
            })
            .collect();
        Self {
            scopes,
            empty: Arc::new(OverrideTable::new()),
        }
    }

    /// Unknown scopes resolve to full normal operation: `(true, empty)`
    pub fn resolve(&self, scope: ScopeId) -> ResolvedOverrides {
        match self.scopes.get(&scope) {
            Some(overrides) => ResolvedOverrides {
                db_allowed: overrides.db,
                table: Arc::clone(&overrides.table),
            },
            None => ResolvedOverrides {
                db_allowed: true,
                table: Arc::clone(&self.empty),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
