//! Round-robin target selection.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::{BackendTarget, TargetSelector};

/// Round-robin selector.
/// Stores an internal counter to rotate through targets.
#[derive(Debug, Default)]
pub struct RoundRobinSelector {
    counter: AtomicUsize,
}

impl RoundRobinSelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TargetSelector for RoundRobinSelector {
    fn select(&self, targets: &[BackendTarget]) -> usize {
        if targets.is_empty() {
            return 0;
        }
        self.counter.fetch_add(1, Ordering::Relaxed) % targets.len()
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}
