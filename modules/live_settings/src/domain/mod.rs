//! Domain layer - registry, values and the resolution service

pub mod editor;
pub mod events;
pub mod group;
pub mod kind;
pub mod modules;
pub mod overrides;
pub mod registry;
pub mod repository;
pub mod scope;
pub mod service;
pub mod validation;
pub mod value;
pub mod visibility;

pub use editor::{FieldSpec, SettingsEditor, Submission, SubmissionOutcome, SubmissionRejected, Widget};
pub use events::{ChannelEventPublisher, EventPublisher, NoOpEventPublisher, SettingEvent};
pub use group::{Group, GroupBuilder, Member, SuperGroup};
pub use kind::ValueKind;
pub use overrides::{OverrideLayer, ResolvedOverrides};
pub use registry::{GroupRef, Registry};
pub use repository::{SettingsCache, SettingsRepository};
pub use scope::{FixedScopeResolver, RequestScope, ScopeResolver, TaskLocalScopeResolver};
pub use service::Service;
pub use value::{Value, ValueBuilder};
pub use visibility::Requirement;
