//! Domain model for alert tasks.
//!
//! Pure types and functions with no I/O: the alert kinds, the static
//! selector tables, the identity scheme and the typed task configuration.

pub mod identity;
pub mod kind;
pub mod tables;
pub mod task;

pub use identity::{classify, derive_identity, AppParts, TaskId};
pub use kind::{AlertKind, DataSource, MEMORY_METRIC};
pub use tables::{sigma_literal, tolerance_to_sigma, DynoSelector};
pub use task::{
    KindSettings, MemorySettings, NotificationTargets, TaskConfig, TaskRequest, TaskStatus,
    Threshold,
};
