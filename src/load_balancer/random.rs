//! Uniform random target selection.

use rand::Rng;

use crate::load_balancer::{BackendTarget, TargetSelector};

/// Picks a target uniformly at random, independently for every request.
#[derive(Debug, Default)]
pub struct RandomSelector;

impl RandomSelector {
    pub fn new() -> Self {
        Self
    }
}

impl TargetSelector for RandomSelector {
    fn select(&self, targets: &[BackendTarget]) -> usize {
        if targets.len() <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..targets.len())
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
