//! In-memory rule engine for testing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    glob_match, EngineError, RegisteredTask, Result, RuleEngine, TaskRegistration, TopicState,
};
use crate::domain::TaskId;
use crate::vars::VariableBag;

/// Rule engine that keeps registrations in memory.
///
/// Failure toggles make individual calls fail with `Unavailable`;
/// `set_reject_create` makes registration fail the way a real engine refuses
/// an invalid script.
#[derive(Default)]
pub struct MockRuleEngine {
    tasks: RwLock<BTreeMap<TaskId, TaskRegistration>>,
    listed: RwLock<Vec<RegisteredTask>>,
    topics: RwLock<Vec<TopicState>>,
    fail_on_create: RwLock<bool>,
    fail_on_delete: RwLock<bool>,
    fail_on_list: RwLock<bool>,
    reject_create: RwLock<Option<String>>,
}

impl MockRuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_create(&self, fail: bool) {
        *self.fail_on_create.write().await = fail;
    }

    pub async fn set_fail_on_delete(&self, fail: bool) {
        *self.fail_on_delete.write().await = fail;
    }

    pub async fn set_fail_on_list(&self, fail: bool) {
        *self.fail_on_list.write().await = fail;
    }

    pub async fn set_reject_create(&self, message: Option<&str>) {
        *self.reject_create.write().await = message.map(str::to_string);
    }

    /// Add a task that only shows up in listings, as if it had been
    /// registered by another tool.
    pub async fn insert_listed(&self, id: &str, vars: VariableBag) {
        self.listed.write().await.push(RegisteredTask {
            id: TaskId::from(id),
            vars,
        });
    }

    pub async fn set_topic(&self, id: &str, level: &str) {
        let mut topics = self.topics.write().await;
        topics.retain(|t| t.id != id);
        topics.push(TopicState {
            id: id.to_string(),
            level: level.to_string(),
        });
    }

    pub async fn get(&self, id: &TaskId) -> Option<TaskRegistration> {
        self.tasks.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &TaskId) -> bool {
        self.tasks.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl RuleEngine for MockRuleEngine {
    async fn create_task(&self, task: &TaskRegistration) -> Result<()> {
        if *self.fail_on_create.read().await {
            return Err(EngineError::Unavailable("mock create failure".to_string()));
        }
        if let Some(message) = self.reject_create.read().await.clone() {
            return Err(EngineError::Rejected {
                status: 400,
                message,
            });
        }
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(EngineError::Rejected {
                status: 400,
                message: format!("task {} already exists", task.id),
            });
        }
        tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<()> {
        if *self.fail_on_delete.read().await {
            return Err(EngineError::Unavailable("mock delete failure".to_string()));
        }
        match self.tasks.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound(id.to_string())),
        }
    }

    async fn list_tasks(&self, pattern: &str) -> Result<Vec<RegisteredTask>> {
        if *self.fail_on_list.read().await {
            return Err(EngineError::Unavailable("mock list failure".to_string()));
        }
        let registered = self.tasks.read().await;
        let listed = self.listed.read().await;
        Ok(registered
            .values()
            .map(|t| RegisteredTask {
                id: t.id.clone(),
                vars: t.vars.clone(),
            })
            .chain(listed.iter().cloned())
            .filter(|t| glob_match(pattern, t.id.as_str()))
            .collect())
    }

    async fn alert_topics(&self, pattern: &str) -> Result<Vec<TopicState>> {
        Ok(self
            .topics
            .read()
            .await
            .iter()
            .filter(|t| glob_match(pattern, &t.id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AlertKind;
    use crate::kinds::RuleScript;

    fn registration(id: &str) -> TaskRegistration {
        TaskRegistration::new(
            TaskId::from(id),
            AlertKind::CrashEvent,
            RuleScript::from("batch".to_string()),
            VariableBag::new(),
        )
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let engine = MockRuleEngine::new();
        engine.create_task(&registration("svc-crash")).await.unwrap();
        engine.create_task(&registration("api-crash")).await.unwrap();

        assert_eq!(engine.list_tasks("*").await.unwrap().len(), 2);
        assert_eq!(engine.list_tasks("svc-*").await.unwrap().len(), 1);

        engine.delete_task(&TaskId::from("svc-crash")).await.unwrap();
        assert!(matches!(
            engine.delete_task(&TaskId::from("svc-crash")).await,
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_toggles() {
        let engine = MockRuleEngine::new();
        engine.set_fail_on_create(true).await;
        assert!(engine.create_task(&registration("svc-crash")).await.is_err());
        assert!(engine.is_empty().await);

        engine.set_fail_on_create(false).await;
        engine.set_reject_create(Some("invalid TICKscript")).await;
        let err = engine
            .create_task(&registration("svc-crash"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Rejected { ref message, .. } if message == "invalid TICKscript"));
    }

    #[tokio::test]
    async fn test_topics_match_pattern() {
        let engine = MockRuleEngine::new();
        engine.set_topic("main:svc-5xx:alert3", "WARNING").await;
        engine.set_topic("main:api-5xx:alert3", "OK").await;
        let topics = engine.alert_topics("*svc-5xx*").await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].level, "WARNING");
    }
}
