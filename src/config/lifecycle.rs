//! Lifecycle coordinator configuration.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Upper bound for each engine or catalog call, in seconds.
    pub deadline_secs: u64,
    /// Serialize operations on the same task identity.
    pub serialize_per_identity: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            deadline_secs: 30,
            serialize_per_identity: true,
        }
    }
}

impl LifecycleConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}
