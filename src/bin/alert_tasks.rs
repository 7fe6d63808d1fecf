//! alert-tasks: alert task lifecycle service
//!
//! ## Architecture
//! ```text
//! [HTTP caller] -> [alert-tasks] -> [Rule engine]
//!                        |
//!                        v
//!                 [Catalog: Postgres/SQLite]
//! ```
//!
//! ## Commands
//! - `serve`: run the HTTP API
//! - `reconcile`: rebuild the catalog from the rule engine's task list
//!
//! ## Configuration
//! - `config.yaml`, `--config <path>` or `ALERTS_CONFIG`
//! - `ALERTS__<SECTION>__<KEY>` environment overrides
//! - `KAPACITOR_URL`, `DATABASE_URL` (legacy)
//! - `ALERTS_LOG`: log filter (default: info)

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use alert_tasks::api;
use alert_tasks::catalog::{init_catalog, Catalog};
use alert_tasks::config::Config;
use alert_tasks::engine::{HttpRuleEngine, RuleEngine};
use alert_tasks::kinds::KindRegistry;
use alert_tasks::lifecycle::AlertTasks;
use alert_tasks::reconcile::Reconciler;
use alert_tasks::utils::bootstrap::{connect_with_retry, init_tracing};

#[derive(Parser)]
#[command(name = "alert-tasks", version, about = "Alert task lifecycle manager")]
struct Cli {
    /// Configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve,
    /// Rebuild the catalog from the rule engine.
    Reconcile,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "alert-tasks failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, BoxError> {
    let config = Config::load(cli.config.as_deref()).map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    let registry = KindRegistry::new(&config.scripts)?;
    let engine: Arc<dyn RuleEngine> = Arc::new(HttpRuleEngine::new(&config.engine)?);
    let catalog: Arc<dyn Catalog> = connect_with_retry(
        "catalog",
        config.catalog.connect_attempts.max(1),
        || init_catalog(&config.catalog),
    )
    .await?;

    match cli.command {
        Command::Serve => {
            info!(engine = %config.engine.url, "starting alert-tasks");
            let tasks = AlertTasks::new(&registry, engine, catalog, &config.lifecycle)?;
            api::serve(&config.server, Arc::new(tasks)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Reconcile => {
            let report = Reconciler::new(engine, catalog, registry)
                .with_deadline(config.lifecycle.deadline())
                .run()
                .await?;
            for (id, reason) in &report.failures {
                error!(%id, %reason, "not imported");
            }
            info!(
                fetched = report.fetched,
                imported = report.imported,
                skipped = report.skipped,
                failed = report.failed,
                "reconcile finished"
            );
            Ok(if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
