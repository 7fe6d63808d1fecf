//! Rebuild the catalog from the rule engine.
//!
//! Reconciliation is a maintenance operation. It drops every catalog table,
//! lists all engine tasks and imports the ones whose identity this service
//! recognizes. A task that cannot be imported is counted and skipped; the run
//! always processes the full list.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::catalog::{Catalog, CatalogError, StoredTask};
use crate::config::LifecycleConfig;
use crate::domain::{classify, AlertKind, KindSettings, TaskConfig, TaskId};
use crate::engine::{EngineError, RegisteredTask, RuleEngine};
use crate::error::{AlertError, Result};
use crate::kinds::KindRegistry;
use crate::lifecycle::bounded;

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Tasks listed by the engine.
    pub fetched: usize,
    pub imported: usize,
    /// Tasks with an identity of unknown shape.
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<(TaskId, String)>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

pub struct Reconciler {
    engine: Arc<dyn RuleEngine>,
    catalog: Arc<dyn Catalog>,
    registry: KindRegistry,
    deadline: Duration,
}

impl Reconciler {
    pub fn new(
        engine: Arc<dyn RuleEngine>,
        catalog: Arc<dyn Catalog>,
        registry: KindRegistry,
    ) -> Self {
        Self {
            engine,
            catalog,
            registry,
            deadline: LifecycleConfig::default().deadline(),
        }
    }

    /// Bound each engine and catalog call by `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Reset the catalog and import every recognizable engine task.
    ///
    /// Fails only if the catalog cannot be reset or the engine cannot be
    /// listed. Per-task failures are reported in the returned report.
    pub async fn run(&self) -> Result<ReconcileReport> {
        info!("Resetting catalog");
        bounded(self.deadline, self.catalog.reset(), CatalogError::Timeout).await?;

        let tasks = bounded(
            self.deadline,
            self.engine.list_tasks("*"),
            EngineError::Timeout,
        )
        .await?;
        info!(count = tasks.len(), "Fetched tasks from rule engine");

        let mut report = ReconcileReport {
            fetched: tasks.len(),
            ..Default::default()
        };

        for task in tasks {
            let Some((kind, dyno)) = classify(task.id.as_str()) else {
                info!(id = %task.id, "Skipping task with unrecognized identity");
                report.skipped += 1;
                continue;
            };

            let id = task.id.clone();
            match self.import(kind, dyno, task).await {
                Ok(()) => {
                    info!(%id, %kind, "Imported task");
                    report.imported += 1;
                }
                Err(e) => {
                    error!(%id, %kind, error = %e, "Failed to import task");
                    report.failed += 1;
                    report.failures.push((id, e.to_string()));
                }
            }
        }

        if report.is_clean() {
            info!(
                imported = report.imported,
                skipped = report.skipped,
                "Reconciliation complete"
            );
        } else {
            warn!(
                imported = report.imported,
                skipped = report.skipped,
                failed = report.failed,
                "Reconciliation complete with failures"
            );
        }
        Ok(report)
    }

    async fn import(
        &self,
        kind: AlertKind,
        dyno: Option<String>,
        task: RegisteredTask,
    ) -> Result<()> {
        let compiled = self.registry.get(kind).ok_or_else(|| {
            AlertError::Configuration(format!("no descriptor registered for {kind}"))
        })?;

        let mut config = compiled.decode(&task.vars);
        if config.app.is_empty() {
            return Err(AlertError::validation("task carries no app variable"));
        }
        if !task.vars.contains("dynotyperequest") {
            fill_dyno_from_identity(&mut config, dyno);
        }

        let stored = StoredTask::new(task.id, config);
        bounded(
            self.deadline,
            self.catalog.insert(&stored),
            CatalogError::Timeout,
        )
        .await?;
        Ok(())
    }
}

/// Memory tasks registered without a `dynotyperequest` variable take their
/// dyno class from the identity.
fn fill_dyno_from_identity(config: &mut TaskConfig, dyno: Option<String>) {
    if let (KindSettings::MemoryUsage(settings), Some(dyno)) = (&mut config.settings, dyno) {
        settings.dyno_class = dyno;
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::catalog::MockCatalog;
    use crate::engine::{self, MockRuleEngine, TaskRegistration, TopicState};
    use crate::vars::{VarType, VariableBag};

    struct StalledEngine;

    #[async_trait]
    impl RuleEngine for StalledEngine {
        async fn create_task(&self, _task: &TaskRegistration) -> engine::Result<()> {
            std::future::pending().await
        }

        async fn delete_task(&self, _id: &TaskId) -> engine::Result<()> {
            std::future::pending().await
        }

        async fn list_tasks(&self, _pattern: &str) -> engine::Result<Vec<RegisteredTask>> {
            std::future::pending().await
        }

        async fn alert_topics(&self, _pattern: &str) -> engine::Result<Vec<TopicState>> {
            std::future::pending().await
        }
    }

    fn bag(entries: &[(&str, &str)]) -> VariableBag {
        let mut bag = VariableBag::new();
        for (name, value) in entries {
            bag.put_str(name, value);
        }
        bag
    }

    fn reconciler(engine: Arc<MockRuleEngine>, catalog: Arc<MockCatalog>) -> Reconciler {
        Reconciler::new(engine, catalog, KindRegistry::standard().unwrap())
    }

    #[tokio::test]
    async fn test_imports_recognized_and_skips_unknown() {
        let engine = Arc::new(MockRuleEngine::new());
        let catalog = Arc::new(MockCatalog::new());

        engine
            .insert_listed(
                "svc-5xx",
                bag(&[("app", "svc"), ("tolerance", "high"), ("slack", "#ops")]),
            )
            .await;
        engine
            .insert_listed("svc-crash", bag(&[("app", "svc"), ("email", "a@x.io,b@x.io")]))
            .await;
        engine.insert_listed("cpu-watchdog", bag(&[("app", "svc")])).await;
        let mut memory = bag(&[
            ("app", "svc"),
            ("dynotyperequest", "worker"),
            ("window", "12h"),
            ("every", "1m"),
        ]);
        memory.encode("crit", "1000", VarType::Int).unwrap();
        memory.encode("warn", "750", VarType::Int).unwrap();
        engine.insert_listed("svc-sample.memory_total-worker", memory).await;

        let report = reconciler(engine, catalog.clone()).run().await.unwrap();

        assert_eq!(report.fetched, 4);
        assert_eq!(report.imported, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(catalog.len().await, 3);

        let crash = catalog
            .find(AlertKind::CrashEvent, &TaskId::from("svc-crash"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(crash.config.targets.chat_channel, None);
        assert_eq!(crash.config.targets.emails, vec!["a@x.io", "b@x.io"]);

        let memory = catalog
            .find(
                AlertKind::MemoryUsage,
                &TaskId::from("svc-sample.memory_total-worker"),
            )
            .await
            .unwrap()
            .unwrap();
        let KindSettings::MemoryUsage(settings) = memory.config.settings else {
            panic!("expected memory settings");
        };
        assert_eq!(settings.dyno_class, "worker");
        assert_eq!(settings.critical_mb, 1000);
    }

    #[tokio::test]
    async fn test_individual_failures_do_not_abort() {
        let engine = Arc::new(MockRuleEngine::new());
        let catalog = Arc::new(MockCatalog::new());
        engine.insert_listed("ghost-crash", VariableBag::new()).await;
        engine
            .insert_listed("svc-release", bag(&[("app", "svc")]))
            .await;

        let report = reconciler(engine, catalog.clone()).run().await.unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].0.as_str(), "ghost-crash");
        assert!(!report.is_clean());
        assert_eq!(catalog.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_dyno_falls_back_to_identity() {
        let engine = Arc::new(MockRuleEngine::new());
        let catalog = Arc::new(MockCatalog::new());
        engine
            .insert_listed("svc-sample.memory_total-web", bag(&[("app", "svc")]))
            .await;

        reconciler(engine, catalog.clone()).run().await.unwrap();

        let stored = catalog
            .find(
                AlertKind::MemoryUsage,
                &TaskId::from("svc-sample.memory_total-web"),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.config.dyno_class(), Some("web"));
    }

    #[tokio::test]
    async fn test_reset_failure_aborts_run() {
        let engine = Arc::new(MockRuleEngine::new());
        let catalog = Arc::new(MockCatalog::new());
        catalog.set_fail_on_reset(true).await;

        let err = reconciler(engine, catalog).run().await.unwrap_err();
        assert!(matches!(err, AlertError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_list_failure_aborts_run() {
        let engine = Arc::new(MockRuleEngine::new());
        engine.set_fail_on_list(true).await;

        let err = reconciler(engine, Arc::new(MockCatalog::new()))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, AlertError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_stalled_engine_listing_times_out() {
        let reconciler = Reconciler::new(
            Arc::new(StalledEngine),
            Arc::new(MockCatalog::new()),
            KindRegistry::standard().unwrap(),
        )
        .with_deadline(Duration::from_millis(20));

        let err = reconciler.run().await.unwrap_err();
        assert!(matches!(err, AlertError::StoreUnavailable(_)));
    }
}
