//! Metrics collection for the batching proxy
//!
//! This module provides Prometheus metrics for observability. All metrics are carefully
//! designed to minimize overhead in the hot path (scheduler and dispatch loop).

use lazy_static::lazy_static;
use prometheus::{Histogram, IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics registry for the proxy
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    pub registry: Arc<Registry>,
    pub intake: IntakeMetrics,
    pub scheduler: SchedulerMetrics,
}

/// Intake (Request Frontend) metrics
#[derive(Debug, Clone)]
pub struct IntakeMetrics {
    /// Total number of classification requests accepted
    pub requests_total: IntCounter,

    /// Total number of successful responses
    pub requests_success: IntCounter,

    /// Total number of failed responses, by the taxonomy in `ProxyError`
    pub requests_failed: IntCounter,

    /// End-to-end proxy latency, intake to response emission
    pub request_duration: Histogram,

    /// Current number of requests awaiting their completion handle
    pub active_requests: IntGauge,
}

/// Scheduler / dispatcher metrics
#[derive(Debug, Clone)]
pub struct SchedulerMetrics {
    /// Downstream round-trip duration
    pub dispatch_duration: Histogram,

    /// Time a ticket spends in the pending queue before being batched
    pub queue_time: Histogram,

    /// Current depth of the pending queue
    pub queue_depth: IntGauge,

    /// Batch size distribution
    pub batch_size: Histogram,

    /// Number of times the active strategy was switched
    pub strategy_switches_total: IntCounter,
}

lazy_static! {
    /// Global metrics registry instance
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}

impl MetricsRegistry {
    /// Create a new metrics registry
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let requests_total =
            IntCounter::new("proxy_requests_total", "Total number of classification requests accepted")
                .unwrap();

        let requests_success = IntCounter::new(
            "proxy_requests_success_total",
            "Total number of successful classification responses",
        )
        .unwrap();

        let requests_failed = IntCounter::new(
            "proxy_requests_failed_total",
            "Total number of failed classification responses",
        )
        .unwrap();

        let request_duration = Histogram::with_opts(
            prometheus::HistogramOpts::new(
                "proxy_request_duration_seconds",
                "End-to-end proxy latency, intake to response emission",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )
        .unwrap();

        let active_requests = IntGauge::new(
            "proxy_active_requests",
            "Current number of requests awaiting their completion handle",
        )
        .unwrap();

        let dispatch_duration = Histogram::with_opts(
            prometheus::HistogramOpts::new(
                "proxy_dispatch_duration_seconds",
                "Downstream round-trip duration per batch",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        )
        .unwrap();

        let queue_time = Histogram::with_opts(
            prometheus::HistogramOpts::new(
                "proxy_queue_time_seconds",
                "Time a ticket spends in the pending queue before being batched",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05]),
        )
        .unwrap();

        let queue_depth = IntGauge::new("proxy_queue_depth", "Current depth of the pending queue").unwrap();

        let batch_size = Histogram::with_opts(
            prometheus::HistogramOpts::new("proxy_batch_size", "Batch size distribution")
                .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0]),
        )
        .unwrap();

        let strategy_switches_total = IntCounter::new(
            "proxy_strategy_switches_total",
            "Total number of times the active strategy was switched",
        )
        .unwrap();

        registry.register(Box::new(requests_total.clone())).unwrap();
        registry.register(Box::new(requests_success.clone())).unwrap();
        registry.register(Box::new(requests_failed.clone())).unwrap();
        registry.register(Box::new(request_duration.clone())).unwrap();
        registry.register(Box::new(active_requests.clone())).unwrap();

        registry.register(Box::new(dispatch_duration.clone())).unwrap();
        registry.register(Box::new(queue_time.clone())).unwrap();
        registry.register(Box::new(queue_depth.clone())).unwrap();
        registry.register(Box::new(batch_size.clone())).unwrap();
        registry
            .register(Box::new(strategy_switches_total.clone()))
            .unwrap();

        let intake = IntakeMetrics {
            requests_total,
            requests_success,
            requests_failed,
            request_duration,
            active_requests,
        };

        let scheduler = SchedulerMetrics {
            dispatch_duration,
            queue_time,
            queue_depth,
            batch_size,
            strategy_switches_total,
        };

        MetricsRegistry {
            registry,
            intake,
            scheduler,
        }
    }

    /// Gather all metrics as Prometheus text exposition
    pub fn gather(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
