//! Catalog contract tests.
//!
//! Every `Catalog` implementation runs this suite through
//! `run_catalog_tests!`. Each test starts from a reset catalog.

use alert_tasks::catalog::{Catalog, StoredTask};
use alert_tasks::domain::{
    derive_identity, AlertKind, KindSettings, MemorySettings, NotificationTargets, TaskConfig,
    TaskStatus,
};

fn targets(slack: Option<&str>, post: Option<&str>, emails: &[&str]) -> NotificationTargets {
    NotificationTargets {
        chat_channel: slack.map(str::to_string),
        webhook_url: post.map(str::to_string),
        emails: emails.iter().map(|e| e.to_string()).collect(),
    }
}

pub fn make_task(app: &str, settings: KindSettings) -> StoredTask {
    let config = TaskConfig {
        app: app.to_string(),
        targets: targets(Some("#ops"), None, &["a@x.io"]),
        settings,
        status: TaskStatus::Enabled,
    };
    StoredTask::new(config.identity(), config)
}

pub fn memory(app: &str, dyno: &str) -> StoredTask {
    make_task(
        app,
        KindSettings::MemoryUsage(MemorySettings {
            dyno_class: dyno.to_string(),
            critical_mb: 1000,
            warning_mb: 750,
            window: "12h".to_string(),
            every: "1m".to_string(),
        }),
    )
}

async fn fresh(catalog: &dyn Catalog) {
    catalog.reset().await.expect("reset should succeed");
}

// =============================================================================
// insert / find
// =============================================================================

pub async fn test_find_returns_inserted_task(catalog: &dyn Catalog) {
    fresh(catalog).await;
    let task = memory("svc", "web");

    catalog.insert(&task).await.expect("insert should succeed");

    let found = catalog
        .find(AlertKind::MemoryUsage, &task.id)
        .await
        .expect("find should succeed");
    assert_eq!(found, Some(task));
}

pub async fn test_find_missing_is_none(catalog: &dyn Catalog) {
    fresh(catalog).await;
    let id = derive_identity("ghost", AlertKind::CrashEvent, None);
    let found = catalog
        .find(AlertKind::CrashEvent, &id)
        .await
        .expect("find should succeed");
    assert!(found.is_none());
}

pub async fn test_rate_anomaly_columns_survive(catalog: &dyn Catalog) {
    fresh(catalog).await;
    let task = make_task(
        "svc",
        KindSettings::RateAnomaly {
            tolerance: "high".to_string(),
            fqdn: Some("svc.example.com".to_string()),
        },
    );
    catalog.insert(&task).await.expect("insert should succeed");

    let found = catalog
        .find(AlertKind::RateAnomaly, &task.id)
        .await
        .expect("find should succeed")
        .expect("task should exist");
    assert_eq!(found, task);
}

pub async fn test_absent_targets_survive(catalog: &dyn Catalog) {
    fresh(catalog).await;
    let mut task = make_task("svc", KindSettings::CrashEvent);
    task.config.targets = targets(None, None, &[]);
    catalog.insert(&task).await.expect("insert should succeed");

    let found = catalog
        .find(AlertKind::CrashEvent, &task.id)
        .await
        .expect("find should succeed")
        .expect("task should exist");
    assert_eq!(found.config.targets, NotificationTargets::default());
}

pub async fn test_duplicate_insert_fails(catalog: &dyn Catalog) {
    fresh(catalog).await;
    let task = make_task("svc", KindSettings::ReleaseEvent);
    catalog.insert(&task).await.expect("insert should succeed");

    assert!(catalog.insert(&task).await.is_err(), "duplicate id must fail");
}

pub async fn test_kinds_are_isolated(catalog: &dyn Catalog) {
    fresh(catalog).await;
    let crash = make_task("svc", KindSettings::CrashEvent);
    let release = make_task("svc", KindSettings::ReleaseEvent);
    catalog.insert(&crash).await.expect("insert should succeed");
    catalog.insert(&release).await.expect("insert should succeed");

    let crashes = catalog
        .list(AlertKind::CrashEvent, None)
        .await
        .expect("list should succeed");
    assert_eq!(crashes, vec![crash]);
}

// =============================================================================
// list
// =============================================================================

pub async fn test_list_orders_by_app(catalog: &dyn Catalog) {
    fresh(catalog).await;
    for app in ["zeta", "alpha", "mid"] {
        catalog
            .insert(&make_task(app, KindSettings::CrashEvent))
            .await
            .expect("insert should succeed");
    }

    let apps: Vec<String> = catalog
        .list(AlertKind::CrashEvent, None)
        .await
        .expect("list should succeed")
        .into_iter()
        .map(|t| t.config.app)
        .collect();
    assert_eq!(apps, vec!["alpha", "mid", "zeta"]);
}

pub async fn test_list_filters_by_app(catalog: &dyn Catalog) {
    fresh(catalog).await;
    for task in [memory("svc", "web"), memory("svc", "worker"), memory("other", "web")] {
        catalog.insert(&task).await.expect("insert should succeed");
    }

    let listed = catalog
        .list(AlertKind::MemoryUsage, Some("svc"))
        .await
        .expect("list should succeed");
    let ids: Vec<&str> = listed.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["svc-sample.memory_total-web", "svc-sample.memory_total-worker"]
    );
}

pub async fn test_list_empty(catalog: &dyn Catalog) {
    fresh(catalog).await;
    let listed = catalog
        .list(AlertKind::RateAnomaly, None)
        .await
        .expect("list should succeed");
    assert!(listed.is_empty());
}

// =============================================================================
// remove / reset
// =============================================================================

pub async fn test_remove_reports_presence(catalog: &dyn Catalog) {
    fresh(catalog).await;
    let task = memory("svc", "web");
    catalog.insert(&task).await.expect("insert should succeed");

    assert!(catalog
        .remove(AlertKind::MemoryUsage, &task.id)
        .await
        .expect("remove should succeed"));
    assert!(!catalog
        .remove(AlertKind::MemoryUsage, &task.id)
        .await
        .expect("remove should succeed"));
    assert!(catalog
        .find(AlertKind::MemoryUsage, &task.id)
        .await
        .expect("find should succeed")
        .is_none());
}

pub async fn test_reset_empties_every_table(catalog: &dyn Catalog) {
    fresh(catalog).await;
    catalog
        .insert(&memory("svc", "web"))
        .await
        .expect("insert should succeed");
    catalog
        .insert(&make_task("svc", KindSettings::CrashEvent))
        .await
        .expect("insert should succeed");

    catalog.reset().await.expect("reset should succeed");

    for kind in AlertKind::ALL {
        let listed = catalog.list(kind, None).await.expect("list should succeed");
        assert!(listed.is_empty(), "{kind} table should be empty");
    }
}

#[macro_export]
macro_rules! run_catalog_tests {
    ($catalog:expr) => {
        use $crate::catalog::*;

        test_find_returns_inserted_task($catalog).await;
        println!("  test_find_returns_inserted_task: PASSED");

        test_find_missing_is_none($catalog).await;
        println!("  test_find_missing_is_none: PASSED");

        test_rate_anomaly_columns_survive($catalog).await;
        println!("  test_rate_anomaly_columns_survive: PASSED");

        test_absent_targets_survive($catalog).await;
        println!("  test_absent_targets_survive: PASSED");

        test_duplicate_insert_fails($catalog).await;
        println!("  test_duplicate_insert_fails: PASSED");

        test_kinds_are_isolated($catalog).await;
        println!("  test_kinds_are_isolated: PASSED");

        test_list_orders_by_app($catalog).await;
        println!("  test_list_orders_by_app: PASSED");

        test_list_filters_by_app($catalog).await;
        println!("  test_list_filters_by_app: PASSED");

        test_list_empty($catalog).await;
        println!("  test_list_empty: PASSED");

        test_remove_reports_presence($catalog).await;
        println!("  test_remove_reports_presence: PASSED");

        test_reset_empties_every_table($catalog).await;
        println!("  test_reset_empties_every_table: PASSED");
    };
}
