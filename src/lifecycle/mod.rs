//! Task lifecycle.
//!
//! A task is either absent or registered in both the rule engine and the
//! catalog. [`LifecycleCoordinator`] moves a task between those states with
//! the engine call and the catalog call in strict sequence:
//!
//! - create registers with the engine first and only then inserts the
//!   catalog row; a failed insert removes the fresh registration again.
//! - delete removes the engine registration first; the catalog row is kept
//!   when that fails so the delete can be retried.
//! - update is delete followed by create.
//!
//! One coordinator exists per alert kind; [`AlertTasks`] bundles the four.

mod locks;
mod tasks;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::catalog::{self, Catalog, CatalogError, StoredTask};
use crate::domain::{derive_identity, AlertKind, TaskConfig, TaskId, TaskRequest};
use crate::engine::{self, EngineError, RuleEngine, TaskRegistration};
use crate::error::{AlertError, Result};
use crate::kinds::CompiledKind;

pub use locks::KeyedLocks;
pub use tasks::{AlertTasks, SeverityState};

/// Runs create, update, delete and reads for one alert kind.
pub struct LifecycleCoordinator {
    kind: Arc<CompiledKind>,
    engine: Arc<dyn RuleEngine>,
    catalog: Arc<dyn Catalog>,
    locks: Option<Arc<KeyedLocks>>,
    deadline: Duration,
}

impl LifecycleCoordinator {
    pub fn new(
        kind: Arc<CompiledKind>,
        engine: Arc<dyn RuleEngine>,
        catalog: Arc<dyn Catalog>,
        deadline: Duration,
    ) -> Self {
        Self {
            kind,
            engine,
            catalog,
            locks: None,
            deadline,
        }
    }

    /// Serialize operations on the same identity through `locks`.
    pub fn with_locks(mut self, locks: Arc<KeyedLocks>) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn kind(&self) -> AlertKind {
        self.kind.kind()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Register a new task.
    ///
    /// `Conflict` if the catalog already holds a task with the same identity.
    pub async fn create(&self, request: &TaskRequest) -> Result<StoredTask> {
        let config = TaskConfig::from_request(self.kind(), request)?;
        let id = config.identity();
        let _guard = self.lock(&id).await;

        if self.find(&id).await?.is_some() {
            return Err(AlertError::Conflict(id));
        }
        self.create_unlocked(id, config).await
    }

    /// Replace an existing task with a new configuration.
    ///
    /// The old registration is removed before the new one is made; a failure
    /// in between leaves the task absent.
    pub async fn update(&self, request: &TaskRequest) -> Result<StoredTask> {
        let config = TaskConfig::from_request(self.kind(), request)?;
        let id = config.identity();
        let _guard = self.lock(&id).await;

        if self.find(&id).await?.is_none() {
            return Err(AlertError::NotFound);
        }
        self.remove_unlocked(&id).await?;
        self.create_unlocked(id, config).await
    }

    /// Remove a task. `dyno` selects the task for kinds with one task per
    /// dyno class and is ignored otherwise.
    pub async fn delete(&self, app: &str, dyno: Option<&str>) -> Result<()> {
        let id = self.identity(app, dyno);
        let _guard = self.lock(&id).await;

        if self.find(&id).await?.is_none() {
            return Err(AlertError::NotFound);
        }
        self.remove_unlocked(&id).await
    }

    pub async fn get(&self, app: &str, dyno: Option<&str>) -> Result<StoredTask> {
        let id = self.identity(app, dyno);
        self.find(&id).await?.ok_or(AlertError::NotFound)
    }

    /// Tasks of this kind ordered by app, optionally for a single app.
    pub async fn list(&self, app: Option<&str>) -> Result<Vec<StoredTask>> {
        let kind = self.kind();
        Ok(self.catalog_call(self.catalog.list(kind, app)).await?)
    }

    // ========================================================================
    // Steps
    // ========================================================================

    fn identity(&self, app: &str, dyno: Option<&str>) -> TaskId {
        let kind = self.kind();
        let dyno = if kind.is_singleton() { None } else { dyno };
        derive_identity(app, kind, dyno)
    }

    async fn lock(&self, id: &TaskId) -> Option<tokio::sync::OwnedMutexGuard<()>> {
        match &self.locks {
            Some(locks) => Some(locks.lock(id).await),
            None => None,
        }
    }

    async fn find(&self, id: &TaskId) -> Result<Option<StoredTask>> {
        let kind = self.kind();
        Ok(self.catalog_call(self.catalog.find(kind, id)).await?)
    }

    async fn create_unlocked(&self, id: TaskId, config: TaskConfig) -> Result<StoredTask> {
        let kind = self.kind();
        let script = self.kind.compile(&config)?;
        let vars = self.kind.encode(&id, &config)?;
        let registration = TaskRegistration::new(id.clone(), kind, script, vars);

        if let Err(e) = self.engine_call(self.engine.create_task(&registration)).await {
            error!(%id, %kind, error = %e, "Rule engine refused task");
            return Err(e.into());
        }
        info!(%id, %kind, "Task registered with rule engine");

        let task = StoredTask::new(id.clone(), config);
        if let Err(e) = self.catalog_call(self.catalog.insert(&task)).await {
            error!(%id, %kind, error = %e, "Catalog insert failed, removing engine registration");
            self.compensate(&id).await;
            return Err(e.into());
        }
        info!(%id, %kind, "Task stored in catalog");
        Ok(task)
    }

    async fn compensate(&self, id: &TaskId) {
        match self.engine_call(self.engine.delete_task(id)).await {
            Ok(()) => info!(%id, "Engine registration rolled back"),
            Err(e) => error!(
                %id,
                error = %e,
                "Rollback of engine registration failed; task is registered but not catalogued"
            ),
        }
    }

    async fn remove_unlocked(&self, id: &TaskId) -> Result<()> {
        let kind = self.kind();
        match self.engine_call(self.engine.delete_task(id)).await {
            Ok(()) => info!(%id, %kind, "Task removed from rule engine"),
            Err(EngineError::NotFound(_)) => {
                warn!(%id, %kind, "Task already absent from rule engine")
            }
            Err(e) => {
                error!(%id, %kind, error = %e, "Rule engine delete failed, catalog row kept");
                return Err(e.into());
            }
        }

        if let Err(e) = self.catalog_call(self.catalog.remove(kind, id)).await {
            error!(
                %id,
                %kind,
                error = %e,
                "Catalog delete failed after engine delete; reconcile to repair"
            );
            return Err(e.into());
        }
        info!(%id, %kind, "Task removed from catalog");
        Ok(())
    }

    async fn engine_call<T>(
        &self,
        call: impl Future<Output = engine::Result<T>>,
    ) -> engine::Result<T> {
        bounded(self.deadline, call, EngineError::Timeout).await
    }

    async fn catalog_call<T>(
        &self,
        call: impl Future<Output = catalog::Result<T>>,
    ) -> catalog::Result<T> {
        bounded(self.deadline, call, CatalogError::Timeout).await
    }
}

/// Run a store call, yielding `elapsed` once `deadline` has passed.
pub(crate) async fn bounded<T, E>(
    deadline: Duration,
    call: impl Future<Output = std::result::Result<T, E>>,
    elapsed: E,
) -> std::result::Result<T, E> {
    tokio::time::timeout(deadline, call)
        .await
        .unwrap_or(Err(elapsed))
}
