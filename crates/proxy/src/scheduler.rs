//! The Scheduler / Dispatcher: the single long-running task that drains the Pending Queue.

use crate::downstream::DownstreamClient;
use crate::queue::PendingQueue;
use crate::strategy::StrategyRegistry;
use proxy_common::metrics::MetricsRegistry;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on how long the dispatcher sleeps while the queue is empty. Bounds wake-up
/// latency without busy-spinning; the queue's `Notify` wakes it sooner whenever a ticket arrives.
const EMPTY_QUEUE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Runs the dispatcher loop until the process is torn down. Intended to be spawned as its own
/// Tokio task; never returns under normal operation.
pub async fn run(
    queue: Arc<PendingQueue>,
    strategy: Arc<StrategyRegistry>,
    downstream: Arc<DownstreamClient>,
    max_batch: usize,
    metrics: &'static MetricsRegistry,
) {
    loop {
        if queue.is_empty() {
            queue.wait_for_ticket(EMPTY_QUEUE_POLL_INTERVAL).await;
        }

        metrics.scheduler.queue_depth.set(queue.len() as i64);

        let active_strategy = strategy.get();
        let batch = queue.take_batch(max_batch, active_strategy);
        if batch.is_empty() {
            continue;
        }

        for ticket in &batch {
            let queue_time = ticket.enqueue_time.elapsed().as_secs_f64();
            metrics.scheduler.queue_time.observe(queue_time);
        }
        metrics.scheduler.batch_size.observe(batch.len() as f64);

        tracing::debug!(
            batch_size = batch.len(),
            strategy = %active_strategy,
            sizes = ?batch.iter().map(|t| t.size).collect::<Vec<_>>(),
            "dispatching batch"
        );

        let items: Vec<Value> = batch.iter().map(|t| t.item.clone()).collect();

        let dispatch_start = std::time::Instant::now();
        let outcome = downstream.classify(&items).await;
        metrics
            .scheduler
            .dispatch_duration
            .observe(dispatch_start.elapsed().as_secs_f64());

        match outcome {
            Ok(results) => {
                for (ticket, result) in batch.into_iter().zip(results.into_iter()) {
                    let _ = ticket.completion.send(Ok(result));
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, batch_size = items.len(), "downstream call failed");
                for ticket in batch {
                    let _ = ticket.completion.send(Err(err.clone()));
                }
            }
        }
    }
}
