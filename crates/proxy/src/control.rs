//! The Control Surface: operator endpoints to read/change strategy, and the expansion endpoints
//! for metrics and liveness.

use crate::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use proxy_common::config::Strategy;
use std::sync::Arc;

/// `GET /strategy` — returns the currently active strategy.
pub async fn get_strategy(State(state): State<Arc<AppState>>) -> Json<String> {
    Json(state.strategy.get().as_str().to_string())
}

/// `POST /strategy` — sets the active strategy. Takes effect on the next batch formation.
pub async fn set_strategy(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<String>,
) -> Response {
    let new_strategy = match Strategy::parse(&raw) {
        Ok(s) => s,
        Err(err) => return err.into_response(),
    };

    let previous = state.strategy.set(new_strategy);
    if previous != new_strategy {
        state.metrics.scheduler.strategy_switches_total.inc();
        if new_strategy == Strategy::Fair {
            state.queue.reset_fair_rotation();
        }
        tracing::info!(from = %previous, to = %new_strategy, "strategy changed");
    }

    Json(new_strategy.as_str().to_string()).into_response()
}

/// `GET /metrics` — Prometheus text exposition of the shared `MetricsRegistry`.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let body = state.metrics.gather();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

/// `GET /health` — liveness probe. Returns 200 while the process is accepting requests.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
