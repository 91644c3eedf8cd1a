//! The Strategy Registry: the single mutable cell holding the active batch-formation strategy.
//!
//! Reads and writes go through a [`parking_lot::Mutex`] rather than an atomic integer because the
//! control surface and the scheduler must observe a consistent view together with any ordering
//! guarantees layered on top (see [`crate::queue::PendingQueue::reset_fair_rotation`]).

use parking_lot::Mutex;
use proxy_common::config::Strategy;

pub struct StrategyRegistry {
    current: Mutex<Strategy>,
}

impl StrategyRegistry {
    pub fn new(initial: Strategy) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }

    pub fn get(&self) -> Strategy {
        *self.current.lock()
    }

    /// Set the active strategy, returning the previous one.
    pub fn set(&self, new: Strategy) -> Strategy {
        let mut current = self.current.lock();
        std::mem::replace(&mut *current, new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_returns_previous_strategy() {
        let registry = StrategyRegistry::new(Strategy::Fcfs);
        let previous = registry.set(Strategy::Sjf);
        assert_eq!(previous, Strategy::Fcfs);
        assert_eq!(registry.get(), Strategy::Sjf);
    }

    #[test]
    fn setting_same_strategy_is_idempotent() {
        let registry = StrategyRegistry::new(Strategy::Fair);
        let previous = registry.set(Strategy::Fair);
        assert_eq!(previous, Strategy::Fair);
        assert_eq!(registry.get(), Strategy::Fair);
    }
}
