//! The Request Ticket: a single pending classification request plus its completion handle.

use proxy_common::ProxyError;
use std::time::Instant;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Default tenant id used when the `X-Customer-Id` header is absent or empty.
pub const DEFAULT_TENANT: &str = "default";

/// The outcome the dispatcher publishes on a ticket's completion handle: the raw downstream
/// result value, forwarded verbatim to the caller alongside `proxy_latency_ms`.
pub type DownstreamResult = serde_json::Value;

/// One-shot rendezvous by which the dispatcher delivers a ticket's outcome to its intake task.
pub type CompletionSender = oneshot::Sender<Result<DownstreamResult, ProxyError>>;
pub type CompletionReceiver = oneshot::Receiver<Result<DownstreamResult, ProxyError>>;

/// A single pending classification request, created on HTTP intake and destroyed once its
/// result has been delivered.
pub struct Ticket {
    /// Identifier used only for tracing/metrics correlation; never sent downstream.
    pub ticket_id: Uuid,

    /// Logical origin of the request, read from the `X-Customer-Id` header.
    pub tenant_id: String,

    /// Opaque payload, forwarded to downstream verbatim. The scheduler never inspects this.
    pub item: serde_json::Value,

    /// Length measure of `item`, used solely by the scheduler for ordering (SJF).
    pub size: usize,

    /// Monotonic timestamp recorded at intake, used for FCFS ordering and queue-time metrics.
    pub enqueue_time: Instant,

    /// Single-shot sender on which the dispatcher publishes this ticket's result or error.
    pub completion: CompletionSender,
}

impl Ticket {
    pub fn new(
        tenant_id: String,
        item: serde_json::Value,
        size: usize,
        completion: CompletionSender,
    ) -> Self {
        Self {
            ticket_id: Uuid::new_v4(),
            tenant_id,
            item,
            size,
            enqueue_time: Instant::now(),
            completion,
        }
    }
}
