//! The batching proxy: request admission and micro-batching in front of a slow downstream
//! classification service.

pub mod control;
pub mod downstream;
pub mod frontend;
pub mod queue;
pub mod scheduler;
pub mod strategy;
pub mod ticket;

use axum::routing::{get, post};
use axum::Router;
use proxy_common::metrics::MetricsRegistry;
use queue::PendingQueue;
use std::sync::Arc;
use strategy::StrategyRegistry;
use tower_http::trace::TraceLayer;

/// Shared state reachable from every HTTP handler: the Pending Queue, the Strategy Registry, and
/// the metrics registry. The Downstream Client is not part of this state; only the dispatcher
/// task holds it, since the Frontend must never call downstream directly.
pub struct AppState {
    pub queue: Arc<PendingQueue>,
    pub strategy: Arc<StrategyRegistry>,
    pub metrics: &'static MetricsRegistry,
}

/// Build the axum `Router`, wiring every route named in the external HTTP surface.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/proxy_classify", post(frontend::proxy_classify))
        .route(
            "/strategy",
            get(control::get_strategy).post(control::set_strategy),
        )
        .route("/metrics", get(control::metrics))
        .route("/health", get(control::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
