//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handlers produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, never preformatted strings
//! - Request ID flows through the per-request span
//! - Metric updates are cheap enough to run on every request

pub mod logging;
pub mod metrics;
