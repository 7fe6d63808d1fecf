//! Alert kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Metric measured by memory-usage tasks. Part of their identity.
pub const MEMORY_METRIC: &str = "sample.memory_total";

/// Closed set of alert kinds.
///
/// The kind selects the script template, the variable schema and the catalog
/// table a task lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertKind {
    RateAnomaly,
    CrashEvent,
    MemoryUsage,
    ReleaseEvent,
}

/// Database / retention policy pair a task reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSource {
    pub db: &'static str,
    pub rp: &'static str,
}

impl AlertKind {
    pub const ALL: [AlertKind; 4] = [
        AlertKind::RateAnomaly,
        AlertKind::CrashEvent,
        AlertKind::MemoryUsage,
        AlertKind::ReleaseEvent,
    ];

    /// Short name used in routes and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::RateAnomaly => "5xx",
            AlertKind::CrashEvent => "crashed",
            AlertKind::MemoryUsage => "memory",
            AlertKind::ReleaseEvent => "released",
        }
    }

    /// Fixed identity suffix for kinds with one task per app.
    pub fn identity_suffix(&self) -> Option<&'static str> {
        match self {
            AlertKind::RateAnomaly => Some("5xx"),
            AlertKind::CrashEvent => Some("crash"),
            AlertKind::ReleaseEvent => Some("release"),
            AlertKind::MemoryUsage => None,
        }
    }

    /// Whether an app can own at most one task of this kind.
    pub fn is_singleton(&self) -> bool {
        self.identity_suffix().is_some()
    }

    pub fn data_source(&self) -> DataSource {
        match self {
            AlertKind::RateAnomaly | AlertKind::CrashEvent => DataSource {
                db: "opentsdb",
                rp: "retention_policy",
            },
            AlertKind::MemoryUsage | AlertKind::ReleaseEvent => DataSource {
                db: "opentsdb",
                rp: "autogen",
            },
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown alert kind: {s}"))
    }
}
