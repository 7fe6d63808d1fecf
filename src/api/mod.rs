//! HTTP API.
//!
//! Every kind exposes the same operation set under its own path segment
//! (`memory`, `5xx`, `crashed`, `released`):
//! - `POST /task/<kind>`: create a task, 201
//! - `PATCH /task/<kind>`: replace a task, 201
//! - `GET /task/<kind>/{app}`: one task (memory: `/task/memory/{app}/{dyno}`)
//! - `DELETE /task/<kind>/{app}`: remove a task (memory: `/task/memory/{app}/{dyno}`)
//! - `GET /tasks/<kind>`: all tasks of the kind, `null` when there are none
//!
//! Plus `GET /tasks/memory/{app}`, `GET /task/5xx/{app}/state` and
//! `GET /health`.

mod handlers;
mod view;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::domain::AlertKind;
use crate::lifecycle::AlertTasks;

pub use view::TaskView;

/// Shared state for axum handlers.
type AppState = Arc<AlertTasks>;

/// Bind the configured address and serve until Ctrl+C.
pub async fn serve(
    config: &ServerConfig,
    tasks: Arc<AlertTasks>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(tasks);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %listener.local_addr()?, "alert task API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutting down");
            }
        })
        .await?;
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(tasks: Arc<AlertTasks>) -> Router {
    let singletons = [
        AlertKind::RateAnomaly,
        AlertKind::CrashEvent,
        AlertKind::ReleaseEvent,
    ];

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/task/5xx/{app}/state",
            get(handlers::severity),
        )
        .merge(memory_routes());
    for kind in singletons {
        router = router.merge(singleton_routes(kind));
    }

    router.layer(TraceLayer::new_for_http()).with_state(tasks)
}

// ============================================================================
// Per-kind routes
// ============================================================================

fn common_routes(kind: AlertKind) -> Router<AppState> {
    let segment = kind.as_str();
    Router::new()
        .route(
            &format!("/task/{segment}"),
            post(move |state: State<AppState>, body: handlers::Payload| {
                handlers::create(kind, state, body)
            })
            .patch(move |state: State<AppState>, body: handlers::Payload| {
                handlers::update(kind, state, body)
            }),
        )
        .route(
            &format!("/tasks/{segment}"),
            get(move |state: State<AppState>| handlers::list(kind, state, None)),
        )
}

fn singleton_routes(kind: AlertKind) -> Router<AppState> {
    let segment = kind.as_str();
    common_routes(kind).route(
        &format!("/task/{segment}/{{app}}"),
        get(move |state: State<AppState>, Path(app): Path<String>| {
            handlers::get_task(kind, state, app, None)
        })
        .delete(move |state: State<AppState>, Path(app): Path<String>| {
            handlers::delete_task(kind, state, app, None)
        }),
    )
}

fn memory_routes() -> Router<AppState> {
    let kind = AlertKind::MemoryUsage;
    common_routes(kind)
        .route(
            "/task/memory/{app}/{dyno}",
            get(
                move |state: State<AppState>, Path((app, dyno)): Path<(String, String)>| {
                    handlers::get_task(kind, state, app, Some(dyno))
                },
            )
            .delete(
                move |state: State<AppState>, Path((app, dyno)): Path<(String, String)>| {
                    handlers::delete_task(kind, state, app, Some(dyno))
                },
            ),
        )
        .route(
            "/tasks/memory/{app}",
            get(move |state: State<AppState>, Path(app): Path<String>| {
                handlers::list(kind, state, Some(app))
            }),
        )
}
