//! Catalog of task configurations.
//!
//! The catalog holds one table per alert kind with the normalized projection
//! of each task's configuration. It is the source of truth for reads; the
//! rule engine's copy is the source of truth for evaluation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::CatalogConfig;
use crate::domain::task::split_emails;
use crate::domain::{
    AlertKind, KindSettings, MemorySettings, NotificationTargets, TaskConfig, TaskId, TaskStatus,
};

pub mod mock;
pub mod schema;
pub mod sql;

pub use mock::MockCatalog;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row that cannot be turned back into a configuration.
    #[error("corrupt catalog row: {0}")]
    Corrupt(String),

    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("catalog call timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTask {
    pub id: TaskId,
    pub config: TaskConfig,
}

impl StoredTask {
    pub fn new(id: TaskId, config: TaskConfig) -> Self {
        Self { id, config }
    }

    pub fn kind(&self) -> AlertKind {
        self.config.kind()
    }
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Create missing tables.
    async fn init(&self) -> Result<()>;

    /// Drop every table and create it again, empty.
    async fn reset(&self) -> Result<()>;

    async fn find(&self, kind: AlertKind, id: &TaskId) -> Result<Option<StoredTask>>;

    /// Tasks of a kind, optionally for one app, ordered by app then id.
    async fn list(&self, kind: AlertKind, app: Option<&str>) -> Result<Vec<StoredTask>>;

    /// Insert a new row. Fails if the id (or, for single-task kinds, the app)
    /// is already present.
    async fn insert(&self, task: &StoredTask) -> Result<()>;

    /// Remove a row. Returns whether a row was removed.
    async fn remove(&self, kind: AlertKind, id: &TaskId) -> Result<bool>;
}

// ============================================================================
// Row projection
// ============================================================================

/// Flat column values of a catalog row.
///
/// Absent notification targets are stored as empty strings. Kind-specific
/// columns are `None` for kinds that do not have them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRow {
    pub id: String,
    pub app: String,
    pub slack: String,
    pub post: String,
    pub email: String,
    pub dynotype: Option<String>,
    pub crit: Option<i64>,
    pub warn: Option<i64>,
    pub window: Option<String>,
    pub every: Option<String>,
    pub tolerance: Option<String>,
    pub fqdn: Option<String>,
}

impl CatalogRow {
    pub fn from_task(task: &StoredTask) -> Self {
        let config = &task.config;
        let targets = &config.targets;
        let mut row = Self {
            id: task.id.to_string(),
            app: config.app.clone(),
            slack: targets.chat_channel.clone().unwrap_or_default(),
            post: targets.webhook_url.clone().unwrap_or_default(),
            email: targets.email_list(),
            ..Default::default()
        };
        match &config.settings {
            KindSettings::MemoryUsage(m) => {
                row.dynotype = Some(m.dyno_class.clone());
                row.crit = Some(m.critical_mb);
                row.warn = Some(m.warning_mb);
                row.window = Some(m.window.clone());
                row.every = Some(m.every.clone());
            }
            KindSettings::RateAnomaly { tolerance, fqdn } => {
                row.tolerance = Some(tolerance.clone());
                row.fqdn = Some(fqdn.clone().unwrap_or_default());
            }
            KindSettings::CrashEvent | KindSettings::ReleaseEvent => {}
        }
        row
    }

    pub fn into_task(self, kind: AlertKind) -> Result<StoredTask> {
        let missing = |column: &str| CatalogError::Corrupt(format!("{} has no {column}", self.id));
        let settings = match kind {
            AlertKind::MemoryUsage => KindSettings::MemoryUsage(MemorySettings {
                dyno_class: self.dynotype.clone().ok_or_else(|| missing("dynotype"))?,
                critical_mb: self.crit.ok_or_else(|| missing("crit"))?,
                warning_mb: self.warn.ok_or_else(|| missing("warn"))?,
                window: self.window.clone().ok_or_else(|| missing("window"))?,
                every: self.every.clone().ok_or_else(|| missing("every"))?,
            }),
            AlertKind::RateAnomaly => KindSettings::RateAnomaly {
                tolerance: self.tolerance.clone().unwrap_or_default(),
                fqdn: self.fqdn.clone().filter(|f| !f.is_empty()),
            },
            AlertKind::CrashEvent => KindSettings::CrashEvent,
            AlertKind::ReleaseEvent => KindSettings::ReleaseEvent,
        };
        Ok(StoredTask {
            id: TaskId::new(self.id),
            config: TaskConfig {
                app: self.app,
                targets: NotificationTargets {
                    chat_channel: Some(self.slack).filter(|s| !s.is_empty()),
                    webhook_url: Some(self.post).filter(|p| !p.is_empty()),
                    emails: split_emails(&self.email),
                },
                settings,
                status: TaskStatus::Enabled,
            },
        })
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Connect to the configured catalog and create its tables.
pub async fn init_catalog(config: &CatalogConfig) -> Result<Arc<dyn Catalog>> {
    info!(catalog = %config.catalog_type, "Connecting to catalog");

    let catalog: Arc<dyn Catalog> = match config.catalog_type.as_str() {
        #[cfg(feature = "postgres")]
        "postgres" => {
            use sqlx::postgres::PgPoolOptions;

            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.postgres.uri)
                .await?;
            Arc::new(sql::postgres::PostgresCatalog::new(pool))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

            let in_memory = config.sqlite.path == ":memory:";
            let opts = SqliteConnectOptions::new()
                .filename(&config.sqlite.path)
                .create_if_missing(true);
            let pool = SqlitePoolOptions::new()
                .max_connections(if in_memory { 1 } else { config.max_connections })
                .connect_with(opts)
                .await?;
            Arc::new(sql::sqlite::SqliteCatalog::new(pool))
        }
        other => {
            return Err(CatalogError::Unavailable(format!(
                "unsupported catalog type: {other}"
            )))
        }
    };

    catalog.init().await?;
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_task() -> StoredTask {
        StoredTask::new(
            TaskId::from("svc-sample.memory_total-web"),
            TaskConfig {
                app: "svc".to_string(),
                targets: NotificationTargets {
                    chat_channel: Some("#ops".to_string()),
                    webhook_url: None,
                    emails: vec!["a@x.io".to_string(), "b@x.io".to_string()],
                },
                settings: KindSettings::MemoryUsage(MemorySettings {
                    dyno_class: "web".to_string(),
                    critical_mb: 1000,
                    warning_mb: 750,
                    window: "12h".to_string(),
                    every: "1m".to_string(),
                }),
                status: TaskStatus::Enabled,
            },
        )
    }

    #[test]
    fn test_row_projection_round_trips() {
        let task = memory_task();
        let row = CatalogRow::from_task(&task);
        assert_eq!(row.post, "");
        assert_eq!(row.email, "a@x.io,b@x.io");
        assert_eq!(row.into_task(AlertKind::MemoryUsage).unwrap(), task);
    }

    #[test]
    fn test_row_missing_memory_columns_is_corrupt() {
        let row = CatalogRow {
            id: "svc-sample.memory_total-web".to_string(),
            app: "svc".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            row.into_task(AlertKind::MemoryUsage),
            Err(CatalogError::Corrupt(_))
        ));
    }

    #[test]
    fn test_empty_fqdn_reads_back_as_absent() {
        let row = CatalogRow {
            id: "svc-5xx".to_string(),
            app: "svc".to_string(),
            tolerance: Some("low".to_string()),
            fqdn: Some(String::new()),
            ..Default::default()
        };
        let task = row.into_task(AlertKind::RateAnomaly).unwrap();
        assert_eq!(
            task.config.settings,
            KindSettings::RateAnomaly {
                tolerance: "low".to_string(),
                fqdn: None
            }
        );
    }
}
