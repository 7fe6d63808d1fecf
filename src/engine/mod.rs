//! Rule engine seam.
//!
//! The rule engine executes registered scripts. This service only registers,
//! removes and lists tasks, and reads alert topic levels.

mod http;
mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{AlertKind, TaskId, TaskStatus};
use crate::kinds::RuleScript;
use crate::vars::VariableBag;

pub use http::HttpRuleEngine;
pub use mock::MockRuleEngine;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No task or topic with this name.
    #[error("not found in rule engine: {0}")]
    NotFound(String),

    /// The engine answered with a non-success status.
    #[error("rule engine rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("rule engine transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected rule engine response: {0}")]
    Decode(String),

    #[error("rule engine call timed out")]
    Timeout,

    /// Engine is not reachable.
    #[error("rule engine unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Database and retention policy a task reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dbrp {
    pub db: String,
    pub rp: String,
}

/// Everything the engine needs to run a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRegistration {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub task_type: String,
    pub dbrps: Vec<Dbrp>,
    pub status: TaskStatus,
    pub script: String,
    pub vars: VariableBag,
}

impl TaskRegistration {
    /// Registration of an enabled batch task.
    pub fn new(id: TaskId, kind: AlertKind, script: RuleScript, vars: VariableBag) -> Self {
        let source = kind.data_source();
        Self {
            id,
            task_type: "batch".to_string(),
            dbrps: vec![Dbrp {
                db: source.db.to_string(),
                rp: source.rp.to_string(),
            }],
            status: TaskStatus::Enabled,
            script: script.into_inner(),
            vars,
        }
    }
}

/// A task as listed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredTask {
    pub id: TaskId,
    #[serde(default)]
    pub vars: VariableBag,
}

/// Current level of an alert topic (`OK`, `INFO`, `WARNING`, `CRITICAL`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicState {
    pub id: String,
    pub level: String,
}

#[async_trait]
pub trait RuleEngine: Send + Sync {
    /// Register a task. Fails if the engine refuses it.
    async fn create_task(&self, task: &TaskRegistration) -> Result<()>;

    /// Remove a task. `NotFound` if the engine does not know it.
    async fn delete_task(&self, id: &TaskId) -> Result<()>;

    /// All tasks whose id matches a glob pattern (`*` for all).
    async fn list_tasks(&self, pattern: &str) -> Result<Vec<RegisteredTask>>;

    /// Alert topics whose id matches a glob pattern.
    async fn alert_topics(&self, pattern: &str) -> Result<Vec<TopicState>>;
}

/// `*`-only glob match, as used by the engine's `pattern` parameter.
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }
    let (first, last) = (parts[0], parts[parts.len() - 1]);
    if text.len() < first.len() + last.len() || !text.starts_with(first) || !text.ends_with(last)
    {
        return false;
    }
    let mut rest = &text[first.len()..text.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("*", "svc-5xx"));
        assert!(glob_match("*svc-5xx*", "svc-5xx"));
        assert!(glob_match("*svc-5xx*", "alerts:svc-5xx:alert2"));
        assert!(glob_match("svc-*", "svc-crash"));
        assert!(glob_match("svc-crash", "svc-crash"));
        assert!(!glob_match("svc-crash", "svc-crashed"));
        assert!(!glob_match("*-5xx", "svc-crash"));
        assert!(!glob_match("ab*ba", "aba"));
    }

    #[test]
    fn test_registration_uses_kind_data_source() {
        let reg = TaskRegistration::new(
            TaskId::from("svc-5xx"),
            AlertKind::RateAnomaly,
            crate::kinds::RuleScript::from("batch".to_string()),
            VariableBag::new(),
        );
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json["type"], "batch");
        assert_eq!(json["status"], "enabled");
        assert_eq!(json["dbrps"][0]["db"], "opentsdb");
        assert_eq!(json["dbrps"][0]["rp"], "retention_policy");
    }
}
