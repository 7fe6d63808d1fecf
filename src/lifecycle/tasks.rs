//! The four lifecycle coordinators behind one handle.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{KeyedLocks, LifecycleCoordinator};
use crate::catalog::Catalog;
use crate::config::LifecycleConfig;
use crate::domain::{derive_identity, AlertKind};
use crate::engine::RuleEngine;
use crate::error::{AlertError, Result};
use crate::kinds::KindRegistry;

/// Current alert level of a rate-anomaly task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeverityState {
    pub app: String,
    pub state: String,
}

pub struct AlertTasks {
    memory: LifecycleCoordinator,
    rate_anomaly: LifecycleCoordinator,
    crash: LifecycleCoordinator,
    release: LifecycleCoordinator,
    engine: Arc<dyn RuleEngine>,
    catalog: Arc<dyn Catalog>,
}

impl AlertTasks {
    /// Build one coordinator per kind in `registry`, all sharing the same
    /// engine and catalog.
    pub fn new(
        registry: &KindRegistry,
        engine: Arc<dyn RuleEngine>,
        catalog: Arc<dyn Catalog>,
        config: &LifecycleConfig,
    ) -> Result<Self> {
        let locks = config
            .serialize_per_identity
            .then(|| Arc::new(KeyedLocks::new()));

        let build = |kind: AlertKind| -> Result<LifecycleCoordinator> {
            let compiled = registry.get(kind).ok_or_else(|| {
                AlertError::Configuration(format!("no descriptor registered for {kind}"))
            })?;
            let coordinator = LifecycleCoordinator::new(
                compiled,
                engine.clone(),
                catalog.clone(),
                config.deadline(),
            );
            Ok(match &locks {
                Some(locks) => coordinator.with_locks(locks.clone()),
                None => coordinator,
            })
        };

        Ok(Self {
            memory: build(AlertKind::MemoryUsage)?,
            rate_anomaly: build(AlertKind::RateAnomaly)?,
            crash: build(AlertKind::CrashEvent)?,
            release: build(AlertKind::ReleaseEvent)?,
            engine,
            catalog,
        })
    }

    pub fn coordinator(&self, kind: AlertKind) -> &LifecycleCoordinator {
        match kind {
            AlertKind::MemoryUsage => &self.memory,
            AlertKind::RateAnomaly => &self.rate_anomaly,
            AlertKind::CrashEvent => &self.crash,
            AlertKind::ReleaseEvent => &self.release,
        }
    }

    pub fn engine(&self) -> Arc<dyn RuleEngine> {
        self.engine.clone()
    }

    pub fn catalog(&self) -> Arc<dyn Catalog> {
        self.catalog.clone()
    }

    /// Level of the alert topic belonging to an app's rate-anomaly task.
    ///
    /// `NotFound` when the app has no such task or the engine has not raised
    /// a topic for it yet.
    pub async fn severity(&self, app: &str) -> Result<SeverityState> {
        self.rate_anomaly.get(app, None).await?;

        let id = derive_identity(app, AlertKind::RateAnomaly, None);
        let pattern = format!("*{id}*");
        let topics = self
            .rate_anomaly
            .engine_call(self.engine.alert_topics(&pattern))
            .await?;
        debug!(%id, topics = topics.len(), "Fetched alert topics");

        // Topic ids are `<handler>:<task id>:<alert node>`; the pattern also
        // matches apps whose name merely ends with this one.
        let topic = topics
            .into_iter()
            .find(|t| t.id.split(':').nth(1) == Some(id.as_str()))
            .ok_or(AlertError::NotFound)?;
        Ok(SeverityState {
            app: app.to_string(),
            state: topic.level,
        })
    }
}
