//! In-memory catalog for testing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Catalog, CatalogError, Result, StoredTask};
use crate::domain::{AlertKind, TaskId};

/// Catalog that keeps rows in memory, with failure injection.
#[derive(Default)]
pub struct MockCatalog {
    rows: RwLock<BTreeMap<(AlertKind, TaskId), StoredTask>>,
    fail_on_find: RwLock<bool>,
    fail_on_insert: RwLock<bool>,
    fail_on_remove: RwLock<bool>,
    fail_on_reset: RwLock<bool>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_find(&self, fail: bool) {
        *self.fail_on_find.write().await = fail;
    }

    pub async fn set_fail_on_insert(&self, fail: bool) {
        *self.fail_on_insert.write().await = fail;
    }

    pub async fn set_fail_on_remove(&self, fail: bool) {
        *self.fail_on_remove.write().await = fail;
    }

    pub async fn set_fail_on_reset(&self, fail: bool) {
        *self.fail_on_reset.write().await = fail;
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

fn injected(op: &str) -> CatalogError {
    CatalogError::Unavailable(format!("mock {op} failure"))
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        if *self.fail_on_reset.read().await {
            return Err(injected("reset"));
        }
        self.rows.write().await.clear();
        Ok(())
    }

    async fn find(&self, kind: AlertKind, id: &TaskId) -> Result<Option<StoredTask>> {
        if *self.fail_on_find.read().await {
            return Err(injected("find"));
        }
        Ok(self.rows.read().await.get(&(kind, id.clone())).cloned())
    }

    async fn list(&self, kind: AlertKind, app: Option<&str>) -> Result<Vec<StoredTask>> {
        if *self.fail_on_find.read().await {
            return Err(injected("list"));
        }
        let rows = self.rows.read().await;
        let mut tasks: Vec<StoredTask> = rows
            .iter()
            .filter(|((k, _), task)| *k == kind && app.map_or(true, |a| task.config.app == a))
            .map(|(_, task)| task.clone())
            .collect();
        tasks.sort_by(|a, b| (&a.config.app, &a.id).cmp(&(&b.config.app, &b.id)));
        Ok(tasks)
    }

    async fn insert(&self, task: &StoredTask) -> Result<()> {
        if *self.fail_on_insert.read().await {
            return Err(injected("insert"));
        }
        let kind = task.kind();
        let mut rows = self.rows.write().await;
        let duplicate_app = kind.is_singleton()
            && rows
                .iter()
                .any(|((k, _), t)| *k == kind && t.config.app == task.config.app);
        if duplicate_app || rows.contains_key(&(kind, task.id.clone())) {
            return Err(CatalogError::Unavailable(format!(
                "duplicate key {} in {kind} catalog",
                task.id
            )));
        }
        rows.insert((kind, task.id.clone()), task.clone());
        Ok(())
    }

    async fn remove(&self, kind: AlertKind, id: &TaskId) -> Result<bool> {
        if *self.fail_on_remove.read().await {
            return Err(injected("remove"));
        }
        Ok(self.rows.write().await.remove(&(kind, id.clone())).is_some())
    }
}
