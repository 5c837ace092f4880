//! Domain events for live settings
//!
//! A `ValueChanged` event is published after every persisted change, carrying the
//! stored forms of the old and new value.

use crate::contract::ScopeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Domain event types for live settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SettingEvent {
    /// A value was updated or reset to its default
    ValueChanged(ValueChangedEvent),
}

/// Event data for a value change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChangedEvent {
    /// Unique event identifier
    pub event_id: Uuid,
    /// Scope the change applies to
    pub scope: i64,
    /// Group key
    pub group: String,
    /// Storage key of the value
    pub key: String,
    /// Stored form before the change (`None` when unset)
    pub old_value: Option<String>,
    /// Stored form after the change
    pub new_value: Option<String>,
    /// Whether the row was deleted because the new value equals the default
    pub reset_to_default: bool,
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
}

impl SettingEvent {
    /// Create a new ValueChanged event
    pub fn value_changed(
        scope: ScopeId,
        group: &str,
        key: &str,
        old_value: Option<String>,
        new_value: Option<String>,
        reset_to_default: bool,
    ) -> Self {
        SettingEvent::ValueChanged(ValueChangedEvent {
            event_id: Uuid::new_v4(),
            scope: scope.0,
            group: group.to_owned(),
            key: key.to_owned(),
            old_value,
            new_value,
            reset_to_default,
            timestamp: Utc::now(),
        })
    }

    /// `group.key` of the changed value
    pub fn identity(&self) -> String {
        match self {
            SettingEvent::ValueChanged(e) => format!("{}.{}", e.group, e.key),
        }
    }
}

/// Event publisher trait for publishing domain events
///
/// Publishers are invoked in subscription order after the change is persisted.
/// A failing publisher is logged and does not undo the change.
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a setting event
    async fn publish(&self, event: SettingEvent) -> anyhow::Result<()>;
}

/// No-op event publisher for testing or when events are disabled
pub struct NoOpEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: SettingEvent) -> anyhow::Result<()> {
        // No-op: events are not published
        Ok(())
    }
}

/// Publisher forwarding events into a bounded channel owned by the host
pub struct ChannelEventPublisher {
    sender: mpsc::Sender<SettingEvent>,
}

impl ChannelEventPublisher {
    /// Create a publisher and the receiving end of its channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SettingEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait::async_trait]
impl EventPublisher for ChannelEventPublisher {
    async fn publish(&self, event: SettingEvent) -> anyhow::Result<()> {
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(event) => {
                anyhow::anyhow!("event channel full, dropped {}", event.identity())
            }
            mpsc::error::TrySendError::Closed(event) => {
                anyhow::anyhow!("event channel closed, dropped {}", event.identity())
            }
        })
    }
}
