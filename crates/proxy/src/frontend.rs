//! The Request Frontend: HTTP intake for `POST /proxy_classify`.

use crate::ticket::{Ticket, DEFAULT_TENANT};
use crate::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};
use proxy_common::error::ProxyError;
use proxy_common::metrics::MetricsRegistry;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;

/// Releases `proxy_active_requests` on every exit path, including the caller disconnecting
/// while the handler is suspended on the completion handle — `Drop` runs even when the
/// surrounding future is cancelled mid-`await`, which a plain `dec()` after the await does not.
struct ActiveRequestGuard {
    metrics: &'static MetricsRegistry,
}

impl Drop for ActiveRequestGuard {
    fn drop(&mut self) {
        self.metrics.intake.active_requests.dec();
    }
}

/// `POST /proxy_classify` — enqueue a single item, await its dispatched result.
///
/// Never calls the Downstream Client directly; it constructs a [`Ticket`], enqueues it, and
/// blocks on the ticket's completion handle. Dropping this future (caller disconnect) drops the
/// `oneshot::Receiver`, which is itself the handle's release.
pub async fn proxy_classify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(item): Json<Value>,
) -> Response {
    let tenant_id = tenant_from_headers(&headers);
    let size = measure_size(&item);

    let (tx, rx) = oneshot::channel();
    let ticket = Ticket::new(tenant_id, item, size, tx);

    let start = Instant::now();
    state.metrics.intake.requests_total.inc();
    state.metrics.intake.active_requests.inc();
    let _active_guard = ActiveRequestGuard {
        metrics: state.metrics,
    };

    state.queue.enqueue(ticket);

    let outcome = rx.await.unwrap_or_else(|_| {
        Err(ProxyError::internal(
            "completion handle dropped without a result",
        ))
    });

    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    state.metrics.intake.request_duration.observe(latency_ms / 1000.0);

    match outcome {
        Ok(result) => {
            state.metrics.intake.requests_success.inc();
            Json(merge_latency(result, latency_ms)).into_response()
        }
        Err(err) => {
            state.metrics.intake.requests_failed.inc();
            err.into_response()
        }
    }
}

fn tenant_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("X-Customer-Id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_TENANT)
        .to_string()
}

/// Length of `item` in the unit the downstream cost model uses: characters of the textual
/// payload. A JSON string is measured directly; any other JSON shape is measured by its
/// serialized form.
fn measure_size(item: &Value) -> usize {
    match item {
        Value::String(s) => s.chars().count(),
        other => serde_json::to_string(other)
            .map(|s| s.chars().count())
            .unwrap_or(0),
    }
}

fn merge_latency(mut result: Value, latency_ms: f64) -> Value {
    match &mut result {
        Value::Object(map) => {
            map.insert(
                "proxy_latency_ms".to_string(),
                serde_json::json!(latency_ms),
            );
            result
        }
        other => serde_json::json!({
            "result": other,
            "proxy_latency_ms": latency_ms,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_size_counts_string_characters() {
        assert_eq!(measure_size(&Value::String("hello".to_string())), 5);
    }

    #[test]
    fn measure_size_falls_back_to_serialized_length() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(measure_size(&value), serde_json::to_string(&value).unwrap().chars().count());
    }

    #[test]
    fn merge_latency_inserts_field_on_object() {
        let merged = merge_latency(serde_json::json!({"label": "spam"}), 12.5);
        assert_eq!(merged["label"], "spam");
        assert_eq!(merged["proxy_latency_ms"], 12.5);
    }

    #[test]
    fn merge_latency_wraps_non_object_results() {
        let merged = merge_latency(serde_json::json!("spam"), 4.0);
        assert_eq!(merged["result"], "spam");
        assert_eq!(merged["proxy_latency_ms"], 4.0);
    }
}
