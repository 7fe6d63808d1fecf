//! Typed task configuration and the wire payload it is built from.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::identity::{derive_identity, TaskId};
use super::kind::AlertKind;
use crate::error::{AlertError, Result};

// ============================================================================
// Notification targets
// ============================================================================

/// Where an alert is delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTargets {
    /// Chat channel, always starting with `#` or `@` once normalized.
    pub chat_channel: Option<String>,
    pub webhook_url: Option<String>,
    pub emails: Vec<String>,
}

impl NotificationTargets {
    /// Build targets from their flat string form.
    ///
    /// The channel is normalized (an absent channel becomes a bare `#`), the
    /// email list is split on commas and empty entries are dropped.
    pub fn from_parts(slack: Option<&str>, post: Option<&str>, email: Option<&str>) -> Self {
        Self {
            chat_channel: Some(normalize_channel(slack.unwrap_or_default())),
            webhook_url: post.filter(|p| !p.is_empty()).map(str::to_string),
            emails: split_emails(email.unwrap_or_default()),
        }
    }

    /// Comma-joined email list, the form stored in the catalog and the bag.
    pub fn email_list(&self) -> String {
        self.emails.join(",")
    }
}

/// Prefix a channel with `#` unless it already names a channel or a user.
pub fn normalize_channel(raw: &str) -> String {
    if raw.starts_with('#') || raw.starts_with('@') {
        raw.to_string()
    } else {
        format!("#{raw}")
    }
}

pub fn split_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Task configuration
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Enabled,
    Disabled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Enabled => "enabled",
            TaskStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds and windows of a memory-usage task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySettings {
    /// `all`, `web` or another dyno class name.
    pub dyno_class: String,
    pub critical_mb: i64,
    pub warning_mb: i64,
    pub window: String,
    pub every: String,
}

/// Kind-specific part of a [`TaskConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KindSettings {
    RateAnomaly {
        tolerance: String,
        fqdn: Option<String>,
    },
    CrashEvent,
    MemoryUsage(MemorySettings),
    ReleaseEvent,
}

/// A fully validated task configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub app: String,
    pub targets: NotificationTargets,
    pub settings: KindSettings,
    pub status: TaskStatus,
}

impl TaskConfig {
    pub fn kind(&self) -> AlertKind {
        match self.settings {
            KindSettings::RateAnomaly { .. } => AlertKind::RateAnomaly,
            KindSettings::CrashEvent => AlertKind::CrashEvent,
            KindSettings::MemoryUsage(_) => AlertKind::MemoryUsage,
            KindSettings::ReleaseEvent => AlertKind::ReleaseEvent,
        }
    }

    pub fn dyno_class(&self) -> Option<&str> {
        match &self.settings {
            KindSettings::MemoryUsage(m) => Some(&m.dyno_class),
            _ => None,
        }
    }

    pub fn identity(&self) -> TaskId {
        derive_identity(&self.app, self.kind(), self.dyno_class())
    }

    /// Validate and normalize a wire payload for the given kind.
    ///
    /// New tasks are always enabled.
    pub fn from_request(kind: AlertKind, req: &TaskRequest) -> Result<Self> {
        validate_app(&req.app)?;
        for (field, value) in [("slack", &req.slack), ("post", &req.post), ("email", &req.email)] {
            if let Some(v) = value {
                validate_target(field, v)?;
            }
        }

        let settings = match kind {
            AlertKind::RateAnomaly => {
                let fqdn = req.fqdn.as_deref().filter(|f| !f.is_empty());
                if let Some(f) = fqdn {
                    validate_target("fqdn", f)?;
                }
                KindSettings::RateAnomaly {
                    tolerance: req.tolerance.clone().unwrap_or_default(),
                    fqdn: fqdn.map(str::to_string),
                }
            }
            AlertKind::CrashEvent => KindSettings::CrashEvent,
            AlertKind::ReleaseEvent => KindSettings::ReleaseEvent,
            AlertKind::MemoryUsage => KindSettings::MemoryUsage(memory_settings(req)?),
        };

        Ok(Self {
            app: req.app.clone(),
            targets: NotificationTargets::from_parts(
                req.slack.as_deref(),
                req.post.as_deref(),
                req.email.as_deref(),
            ),
            settings,
            status: TaskStatus::Enabled,
        })
    }
}

fn memory_settings(req: &TaskRequest) -> Result<MemorySettings> {
    let dyno_class = match req.dynotype.as_deref() {
        None | Some("") => "all".to_string(),
        Some(class) if class.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
            class.to_string()
        }
        Some(class) => {
            return Err(AlertError::validation(format!(
                "dynotype must be alphanumeric, got {class:?}"
            )))
        }
    };
    Ok(MemorySettings {
        dyno_class,
        critical_mb: required_threshold("crit", req.crit.as_ref())?,
        warning_mb: required_threshold("warn", req.warn.as_ref())?,
        window: required_duration("window", req.window.as_deref())?,
        every: required_duration("every", req.every.as_deref())?,
    })
}

// ============================================================================
// Wire payload
// ============================================================================

/// Flat JSON payload accepted by create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRequest {
    pub app: String,
    pub slack: Option<String>,
    pub post: Option<String>,
    /// Comma-separated addresses.
    pub email: Option<String>,
    pub dynotype: Option<String>,
    pub crit: Option<Threshold>,
    pub warn: Option<Threshold>,
    pub window: Option<String>,
    pub every: Option<String>,
    pub tolerance: Option<String>,
    pub fqdn: Option<String>,
}

/// A threshold given either as a JSON number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Threshold {
    pub fn to_int(&self, field: &str) -> Result<i64> {
        match self {
            Threshold::Int(n) => Ok(*n),
            Threshold::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
            Threshold::Float(f) => Err(AlertError::validation(format!(
                "{field} must be a whole number of megabytes, got {f}"
            ))),
            Threshold::Text(s) => s.trim().parse::<i64>().map_err(|_| {
                AlertError::validation(format!("{field} must be an integer, got {s:?}"))
            }),
        }
    }
}

// ============================================================================
// Boundary validation
// ============================================================================

static DURATION_LITERAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(u|µ|ms|s|m|h|d|w)$").ok());

pub fn validate_app(app: &str) -> Result<()> {
    if app.is_empty() {
        return Err(AlertError::validation("app is required"));
    }
    if !app
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(AlertError::validation(format!(
            "app contains invalid characters: {app:?}"
        )));
    }
    Ok(())
}

fn validate_target(field: &str, value: &str) -> Result<()> {
    if value.contains(['\'', '\n', '\r']) {
        return Err(AlertError::validation(format!(
            "{field} must not contain quotes or line breaks"
        )));
    }
    Ok(())
}

fn required_threshold(field: &str, value: Option<&Threshold>) -> Result<i64> {
    value
        .ok_or_else(|| AlertError::validation(format!("{field} is required")))?
        .to_int(field)
}

fn required_duration(field: &str, value: Option<&str>) -> Result<String> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AlertError::validation(format!("{field} is required")))?;
    let valid = DURATION_LITERAL
        .as_ref()
        .is_some_and(|re| re.is_match(value));
    if !valid {
        return Err(AlertError::validation(format!(
            "{field} must be a duration such as 30s, 5m or 12h, got {value:?}"
        )));
    }
    Ok(value.to_string())
}
