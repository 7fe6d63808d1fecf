//! Request handlers, generic over the alert kind.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::view::TaskView;
use super::AppState;
use crate::domain::{AlertKind, TaskRequest};
use crate::error::{AlertError, Result};
use crate::lifecycle::SeverityState;

/// JSON body, with a malformed body reported as a validation failure.
pub(super) type Payload = std::result::Result<Json<TaskRequest>, JsonRejection>;

fn request(body: Payload) -> Result<TaskRequest> {
    body.map(|Json(request)| request)
        .map_err(|rejection| AlertError::validation(rejection.body_text()))
}

pub(super) async fn health() -> StatusCode {
    StatusCode::OK
}

pub(super) async fn create(
    kind: AlertKind,
    State(tasks): State<AppState>,
    body: Payload,
) -> Result<(StatusCode, Json<TaskView>)> {
    let task = tasks.coordinator(kind).create(&request(body)?).await?;
    Ok((StatusCode::CREATED, Json(TaskView::from(&task))))
}

pub(super) async fn update(
    kind: AlertKind,
    State(tasks): State<AppState>,
    body: Payload,
) -> Result<(StatusCode, Json<TaskView>)> {
    let task = tasks.coordinator(kind).update(&request(body)?).await?;
    Ok((StatusCode::CREATED, Json(TaskView::from(&task))))
}

pub(super) async fn get_task(
    kind: AlertKind,
    State(tasks): State<AppState>,
    app: String,
    dyno: Option<String>,
) -> Result<Json<TaskView>> {
    let task = tasks.coordinator(kind).get(&app, dyno.as_deref()).await?;
    Ok(Json(TaskView::from(&task)))
}

pub(super) async fn delete_task(
    kind: AlertKind,
    State(tasks): State<AppState>,
    app: String,
    dyno: Option<String>,
) -> Result<StatusCode> {
    tasks.coordinator(kind).delete(&app, dyno.as_deref()).await?;
    Ok(StatusCode::OK)
}

/// `null` rather than `[]` when nothing matches.
pub(super) async fn list(
    kind: AlertKind,
    State(tasks): State<AppState>,
    app: Option<String>,
) -> Result<Json<Option<Vec<TaskView>>>> {
    let listed = tasks.coordinator(kind).list(app.as_deref()).await?;
    if listed.is_empty() {
        return Ok(Json(None));
    }
    Ok(Json(Some(listed.iter().map(TaskView::from).collect())))
}

pub(super) async fn severity(
    State(tasks): State<AppState>,
    Path(app): Path<String>,
) -> Result<Json<SeverityState>> {
    Ok(Json(tasks.severity(&app).await?))
}
