//! Conditional visibility between values

use super::value::Value;
use crate::contract::NativeValue;
use std::fmt;
use std::sync::Arc;

/// Dependency of a value or group on another value
#[derive(Clone)]
pub struct Requirement {
    /// Value whose current state decides visibility
    pub target: Arc<Value>,
    /// Choice key that must be selected when the target has choices
    pub trigger: String,
}

impl Requirement {
    pub fn new(target: Arc<Value>, trigger: impl Into<String>) -> Self {
        Self {
            target,
            trigger: trigger.into(),
        }
    }

    /// Whether `current` (the target's value) satisfies this requirement.
    ///
    /// Targets with choices must select the trigger (equality for scalars, membership
    /// for lists); targets without choices only need to be truthy.
    pub fn is_met_by(&self, current: &NativeValue) -> bool {
        if self.target.has_choices() {
            current.selects(&self.trigger)
        } else {
            current.is_truthy()
        }
    }
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requirement")
            .field("target", &self.target.identity())
            .field("trigger", &self.trigger)
            .finish()
    }
}
