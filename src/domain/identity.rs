//! Task identities.
//!
//! An identity is derived from the owning app, the alert kind and, for memory
//! tasks, the dyno class. It is never chosen by the caller, so the same logical
//! configuration always lands on the same engine task and catalog row.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::kind::{AlertKind, MEMORY_METRIC};

/// Deterministic name of one task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Compute the identity of a task.
///
/// `dyno` only matters for [`AlertKind::MemoryUsage`]; absent or empty means
/// `all`.
pub fn derive_identity(app: &str, kind: AlertKind, dyno: Option<&str>) -> TaskId {
    match kind.identity_suffix() {
        Some(suffix) => TaskId(format!("{app}-{suffix}")),
        None => {
            let class = dyno.filter(|d| !d.is_empty()).unwrap_or("all");
            TaskId(format!("{app}-{MEMORY_METRIC}-{class}"))
        }
    }
}

/// Components of a compound app name such as `foo--worker-us1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppParts {
    pub short_app: String,
    pub dyno_type: String,
    pub space: String,
}

impl AppParts {
    /// Split a compound app name.
    ///
    /// With a `--` separator the short name precedes it, the dyno type is the
    /// first `-` segment after it and the space is the rest of that `--`
    /// segment. Without it the dyno type is `web` and the text is split at the
    /// first `-`.
    pub fn parse(full: &str) -> Self {
        if full.contains("--") {
            let mut halves = full.split("--");
            let short_app = halves.next().unwrap_or_default().to_string();
            let tail = halves.next().unwrap_or_default();
            let mut segments = tail.split('-');
            let dyno_type = segments.next().unwrap_or_default().to_string();
            let space = segments.collect::<Vec<_>>().join("-");
            Self {
                short_app,
                dyno_type,
                space,
            }
        } else {
            let (short_app, space) = full.split_once('-').unwrap_or((full, ""));
            Self {
                short_app: short_app.to_string(),
                dyno_type: "web".to_string(),
                space: space.to_string(),
            }
        }
    }
}

static IDENTITY_SHAPE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^.*((-sample\.memory_total-(\w+))|-(release|5xx|crash))$").ok()
});

/// Recover the kind (and dyno class for memory tasks) from an identity.
///
/// Returns `None` for identities this service did not produce.
pub fn classify(id: &str) -> Option<(AlertKind, Option<String>)> {
    let caps = IDENTITY_SHAPE.as_ref()?.captures(id)?;
    if let Some(dyno) = caps.get(3) {
        return Some((AlertKind::MemoryUsage, Some(dyno.as_str().to_string())));
    }
    let kind = match caps.get(4)?.as_str() {
        "5xx" => AlertKind::RateAnomaly,
        "crash" => AlertKind::CrashEvent,
        "release" => AlertKind::ReleaseEvent,
        _ => return None,
    };
    Some((kind, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_identities() {
        assert_eq!(derive_identity("svc", AlertKind::RateAnomaly, None).as_str(), "svc-5xx");
        assert_eq!(derive_identity("svc", AlertKind::CrashEvent, None).as_str(), "svc-crash");
        assert_eq!(derive_identity("svc", AlertKind::ReleaseEvent, None).as_str(), "svc-release");
    }

    #[test]
    fn test_singleton_identity_ignores_dyno() {
        assert_eq!(
            derive_identity("svc", AlertKind::CrashEvent, Some("worker")).as_str(),
            "svc-crash"
        );
    }

    #[test]
    fn test_memory_identity_includes_dyno_class() {
        let web = derive_identity("svc", AlertKind::MemoryUsage, Some("web"));
        let worker = derive_identity("svc", AlertKind::MemoryUsage, Some("worker"));
        assert_eq!(web.as_str(), "svc-sample.memory_total-web");
        assert_eq!(worker.as_str(), "svc-sample.memory_total-worker");
        assert_ne!(web, worker);
    }

    #[test]
    fn test_memory_identity_defaults_to_all() {
        assert_eq!(
            derive_identity("svc", AlertKind::MemoryUsage, None).as_str(),
            "svc-sample.memory_total-all"
        );
        assert_eq!(
            derive_identity("svc", AlertKind::MemoryUsage, Some("")).as_str(),
            "svc-sample.memory_total-all"
        );
    }

    #[test]
    fn test_identity_is_deterministic() {
        for kind in AlertKind::ALL {
            assert_eq!(
                derive_identity("api-us1", kind, Some("web")),
                derive_identity("api-us1", kind, Some("web"))
            );
        }
    }

    #[test]
    fn test_parse_app_with_dyno_class() {
        let parts = AppParts::parse("foo--worker-us1");
        assert_eq!(parts.short_app, "foo");
        assert_eq!(parts.dyno_type, "worker");
        assert_eq!(parts.space, "us1");
    }

    #[test]
    fn test_parse_app_without_dyno_class_defaults_to_web() {
        let parts = AppParts::parse("foo-us1");
        assert_eq!(parts.short_app, "foo");
        assert_eq!(parts.dyno_type, "web");
        assert_eq!(parts.space, "us1");
    }

    #[test]
    fn test_parse_app_rejoins_multi_segment_space() {
        let parts = AppParts::parse("foo--worker-us1-prod");
        assert_eq!(parts.space, "us1-prod");

        let parts = AppParts::parse("foo-us1-prod");
        assert_eq!(parts.short_app, "foo");
        assert_eq!(parts.space, "us1-prod");
    }

    #[test]
    fn test_parse_app_without_separator() {
        let parts = AppParts::parse("foo");
        assert_eq!(parts.short_app, "foo");
        assert_eq!(parts.dyno_type, "web");
        assert_eq!(parts.space, "");
    }

    #[test]
    fn test_classify_recognised_identities() {
        assert_eq!(
            classify("svc-sample.memory_total-worker"),
            Some((AlertKind::MemoryUsage, Some("worker".to_string())))
        );
        assert_eq!(classify("svc-us1-5xx"), Some((AlertKind::RateAnomaly, None)));
        assert_eq!(classify("svc-crash"), Some((AlertKind::CrashEvent, None)));
        assert_eq!(classify("svc-release"), Some((AlertKind::ReleaseEvent, None)));
    }

    #[test]
    fn test_classify_skips_foreign_identities() {
        assert_eq!(classify("cpu_alert"), None);
        assert_eq!(classify("svc-memory"), None);
        assert_eq!(classify("svc-5xx-old"), None);
    }

    #[test]
    fn test_classify_inverts_derive() {
        for kind in AlertKind::ALL {
            let id = derive_identity("svc", kind, Some("web"));
            let (classified, _) = classify(id.as_str()).unwrap();
            assert_eq!(classified, kind);
        }
    }
}
