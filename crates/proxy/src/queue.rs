//! The Pending Queue: a strategy-parameterised, mutual-exclusion-guarded multiset of tickets.
//!
//! All access goes through [`PendingQueue::enqueue`] and [`PendingQueue::take_batch`]; the queue
//! itself is never exposed to callers. A single [`parking_lot::Mutex`] covers both operations, and
//! a [`tokio::sync::Notify`] wakes the scheduler when the queue transitions from empty to
//! non-empty.

use crate::ticket::Ticket;
use parking_lot::Mutex;
use proxy_common::config::Strategy;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::Notify;

struct QueueState {
    /// Master store, in strict enqueue order. FCFS and SJF operate directly on this; FAIR scans
    /// it to find each tenant's oldest ticket.
    tickets: VecDeque<Ticket>,

    /// Tenant rotation order for FAIR: first-seen, with newly-discovered tenants within a single
    /// formation appended in alphabetical order.
    known_tenants: Vec<String>,

    /// Cursor into `known_tenants` for the next FAIR formation.
    fair_cursor: usize,
}

impl QueueState {
    fn new() -> Self {
        Self {
            tickets: VecDeque::new(),
            known_tenants: Vec::new(),
            fair_cursor: 0,
        }
    }
}

/// The Pending Queue.
pub struct PendingQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::new()),
            notify: Notify::new(),
        }
    }

    /// Enqueue a ticket. Wakes a waiting scheduler, if any.
    pub fn enqueue(&self, ticket: Ticket) {
        let mut state = self.state.lock();
        state.tickets.push_back(ticket);
        drop(state);
        self.notify.notify_one();
    }

    /// Current number of pending tickets (used for the queue-depth gauge).
    pub fn len(&self) -> usize {
        self.state.lock().tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until a ticket has been enqueued, or `timeout` elapses, whichever comes first.
    /// Never busy-spins: the caller is suspended on the `Notify` for the duration.
    pub async fn wait_for_ticket(&self, timeout: std::time::Duration) {
        let notified = self.notify.notified();
        let _ = tokio::time::timeout(timeout, notified).await;
    }

    /// Reset FAIR's rotation state. Invoked when the active strategy transitions into FAIR.
    pub fn reset_fair_rotation(&self) {
        let mut state = self.state.lock();
        state.known_tenants.clear();
        state.fair_cursor = 0;
    }

    /// Atomically remove and return up to `max_size` tickets, ordered per `strategy`. May return
    /// an empty vector if the queue is empty.
    pub fn take_batch(&self, max_size: usize, strategy: Strategy) -> Vec<Ticket> {
        let mut state = self.state.lock();
        match strategy {
            Strategy::Fcfs => Self::take_fcfs(&mut state, max_size),
            Strategy::Sjf => Self::take_sjf(&mut state, max_size),
            Strategy::Fair => Self::take_fair(&mut state, max_size),
        }
    }

    fn take_fcfs(state: &mut QueueState, max_size: usize) -> Vec<Ticket> {
        let n = max_size.min(state.tickets.len());
        state.tickets.drain(..n).collect()
    }

    fn take_sjf(state: &mut QueueState, max_size: usize) -> Vec<Ticket> {
        let n = max_size.min(state.tickets.len());
        if n == 0 {
            return Vec::new();
        }

        // Stable sort by size keeps ties in enqueue order, satisfying the "earlier enqueue
        // first" tie-break. `order` is the desired output order: ascending size.
        let mut order: Vec<usize> = (0..state.tickets.len()).collect();
        order.sort_by_key(|&i| state.tickets[i].size);
        order.truncate(n);

        // Remove from the back forward so earlier indices stay valid, but keep each ticket
        // keyed by its original index so it can be re-assembled in size order afterwards.
        let mut removal_order = order.clone();
        removal_order.sort_unstable_by(|a, b| b.cmp(a));
        let mut removed: HashMap<usize, Ticket> = HashMap::with_capacity(n);
        for i in removal_order {
            let ticket = state.tickets.remove(i).expect("index was in bounds");
            removed.insert(i, ticket);
        }

        order
            .into_iter()
            .map(|i| removed.remove(&i).expect("index was removed above"))
            .collect()
    }

    fn take_fair(state: &mut QueueState, max_size: usize) -> Vec<Ticket> {
        let present: HashSet<&str> = state
            .tickets
            .iter()
            .map(|t| t.tenant_id.as_str())
            .collect();

        let mut newly_seen: Vec<String> = present
            .iter()
            .filter(|t| !state.known_tenants.iter().any(|k| k == *t))
            .map(|t| t.to_string())
            .collect();
        newly_seen.sort();
        state.known_tenants.extend(newly_seen);

        if state.known_tenants.is_empty() {
            return Vec::new();
        }

        let n = state.known_tenants.len();
        let mut idx = state.fair_cursor % n;
        let mut consecutive_empty = 0usize;
        let mut batch = Vec::new();

        while batch.len() < max_size && consecutive_empty < n {
            let tenant = state.known_tenants[idx].clone();
            match Self::take_oldest_for_tenant(&mut state.tickets, &tenant) {
                Some(ticket) => {
                    batch.push(ticket);
                    consecutive_empty = 0;
                }
                None => consecutive_empty += 1,
            }
            idx = (idx + 1) % n;
        }

        state.fair_cursor = idx;
        batch
    }

    fn take_oldest_for_tenant(tickets: &mut VecDeque<Ticket>, tenant: &str) -> Option<Ticket> {
        let pos = tickets.iter().position(|t| t.tenant_id == tenant)?;
        tickets.remove(pos)
    }
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new()
    }
}
