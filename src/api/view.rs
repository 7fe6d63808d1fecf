//! Response bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::catalog::{CatalogRow, StoredTask};
use crate::error::AlertError;

/// A task as returned to callers: the catalog row, with absent targets as
/// empty strings and only the columns the kind has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: String,
    pub app: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynotype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    pub slack: String,
    pub post: String,
    pub email: String,
}

impl From<&StoredTask> for TaskView {
    fn from(task: &StoredTask) -> Self {
        let row = CatalogRow::from_task(task);
        Self {
            id: row.id,
            app: row.app,
            dynotype: row.dynotype,
            crit: row.crit,
            warn: row.warn,
            window: row.window,
            every: row.every,
            tolerance: row.tolerance,
            fqdn: row.fqdn,
            slack: row.slack,
            post: row.post,
            email: row.email,
        }
    }
}

impl IntoResponse for AlertError {
    fn into_response(self) -> Response {
        let status = match &self {
            AlertError::NotFound => StatusCode::NOT_FOUND,
            AlertError::Conflict(_) => StatusCode::CONFLICT,
            AlertError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            AlertError::UpstreamRejected(_) => StatusCode::BAD_GATEWAY,
            AlertError::StoreUnavailable(_) | AlertError::Configuration(_) => {
                error!(error = %self, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        KindSettings, MemorySettings, NotificationTargets, TaskConfig, TaskId, TaskStatus,
    };

    #[test]
    fn test_memory_view_carries_memory_columns() {
        let task = StoredTask::new(
            TaskId::from("svc-sample.memory_total-web"),
            TaskConfig {
                app: "svc".to_string(),
                targets: NotificationTargets {
                    chat_channel: Some("#ops".to_string()),
                    webhook_url: None,
                    emails: vec!["a@x.io".to_string()],
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
        );

        let json = serde_json::to_value(TaskView::from(&task)).unwrap();

        assert_eq!(json["dynotype"], "web");
        assert_eq!(json["crit"], 1000);
        assert_eq!(json["post"], "");
        assert!(json.get("tolerance").is_none());
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (AlertError::NotFound, StatusCode::NOT_FOUND),
            (
                AlertError::Conflict(TaskId::from("svc-crash")),
                StatusCode::CONFLICT,
            ),
            (AlertError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                AlertError::UpstreamRejected("no".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AlertError::StoreUnavailable("down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
