//! Backend target selection subsystem.
//!
//! # Data Flow
//! ```text
//! reverse.targets (config)
//!     → target.rs (parse & validate each base URL once)
//!     → Arc<[BackendTarget]> (immutable, shared read-only)
//!     → Apply selection strategy per request:
//!         - random.rs (uniform, no memory)
//!         - round_robin.rs (rotate through targets)
//!     → index of the chosen target
//! ```
//!
//! # Design Decisions
//! - Selectors never own the target list; they only pick an index into it
//! - The list is non-empty by construction, so selection cannot fail
//! - No session affinity, weighting, or health awareness

pub mod random;
pub mod round_robin;
pub mod target;

pub use random::RandomSelector;
pub use round_robin::RoundRobinSelector;
pub use target::{BackendTarget, TargetError};

/// Strategy for choosing one target out of a static list.
pub trait TargetSelector: Send + Sync + std::fmt::Debug {
    /// Return an index in `[0, targets.len())`.
    ///
    /// Callers guarantee `targets` is not empty.
    fn select(&self, targets: &[BackendTarget]) -> usize;

    /// Strategy name for logging.
    fn name(&self) -> &'static str;
}
