//! HTTP request handlers: dashboard page, API endpoints, SSE streaming.

use std::convert::Infallible;
use std::sync::atomic::Ordering;

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, Json};
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use dataweb_core::api::snapshot::ApiDashboard;
use dataweb_core::render::render_unavailable_page;

use crate::state::{AppState, SSE_CONNECTIONS};

// ============================================================
// Health
// ============================================================

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct HealthStatus {
    /// `ok` after a successful last poll, `degraded` when the last poll failed,
    /// `waiting` before the first snapshot.
    status: String,
    /// Successful polls since startup.
    snapshots: u64,
    /// Unix timestamp of the last successful poll.
    #[serde(skip_serializing_if = "Option::is_none")]
    last_success: Option<i64>,
    /// Error from the last poll, if it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Poller status", body = HealthStatus)
    )
)]
pub(crate) async fn handle_health(State(state_tuple): AppState) -> Json<HealthStatus> {
    let inner = state_tuple.0.lock().unwrap();
    let status = match (&inner.last_error, inner.snapshot_count) {
        (Some(_), _) => "degraded",
        (None, 0) => "waiting",
        (None, _) => "ok",
    };
    Json(HealthStatus {
        status: status.to_string(),
        snapshots: inner.snapshot_count,
        last_success: inner.last_success,
        last_error: inner.last_error.clone(),
    })
}

// ============================================================
// Dashboard
// ============================================================

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Latest projected dashboard", body = ApiDashboard),
        (status = 503, description = "No snapshot available yet")
    )
)]
pub(crate) async fn handle_dashboard(
    State(state_tuple): AppState,
) -> Result<axum::response::Response, StatusCode> {
    let dash = state_tuple
        .0
        .lock()
        .unwrap()
        .current
        .clone()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let json =
        serde_json::to_string(dash.as_ref()).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    axum::response::Response::builder()
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

// ============================================================
// SSE stream
// ============================================================

struct SseGuard;

impl Drop for SseGuard {
    fn drop(&mut self) {
        let active = SSE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed) - 1;
        info!(active_connections = active, "SSE client disconnected");
    }
}

fn dashboard_event(dash: &ApiDashboard) -> Option<Event> {
    match serde_json::to_string(dash) {
        Ok(json) => Some(Event::default().event("dashboard").data(json)),
        Err(e) => {
            error!(error = %e, "failed to serialize dashboard");
            None
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/stream",
    responses(
        (status = 200, description = "Server-sent `dashboard` events, one per poll", body = String, content_type = "text/event-stream")
    )
)]
pub(crate) async fn handle_stream(
    State(state_tuple): AppState,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let (state, tx) = state_tuple;
    // Subscribe before reading the current dashboard so no tick falls in between
    let mut rx = tx.subscribe();
    let initial = state.lock().unwrap().current.clone();

    let active = SSE_CONNECTIONS.fetch_add(1, Ordering::Relaxed) + 1;
    info!(active_connections = active, "SSE client connected");

    let stream = async_stream::stream! {
        let _guard = SseGuard;
        if let Some(event) = initial.as_deref().and_then(dashboard_event) {
            yield Ok(event);
        }
        loop {
            match rx.recv().await {
                Ok(dash) => {
                    if let Some(event) = dashboard_event(&dash) {
                        yield Ok(event);
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// ============================================================
// HTML page
// ============================================================

pub(crate) async fn serve_page(State(state_tuple): AppState) -> (StatusCode, Html<String>) {
    let inner = state_tuple.0.lock().unwrap();
    match &inner.current_page {
        Some(page) => (StatusCode::OK, Html(page.as_str().to_owned())),
        None => {
            let message = match &inner.last_error {
                Some(e) => format!("Dashboard unavailable: {e}"),
                None => "Waiting for first snapshot".to_string(),
            };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Html(render_unavailable_page(
                    &inner.instrument,
                    &message,
                    Some(inner.refresh_secs),
                )),
            )
        }
    }
}
