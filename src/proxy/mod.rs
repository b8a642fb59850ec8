//! Proxy handlers.
//!
//! # Data Flow
//! ```text
//! forward listener → forward.rs
//!     → copy request, append X-Forwarded-For
//!     → Transport::round_trip → relay or 502
//!
//! reverse listener → reverse.rs
//!     → director (TargetRewriter picks a BackendTarget)
//!     → strip hop-by-hop, append X-Forwarded-For
//!     → Transport::round_trip → relay or 502
//! ```
//!
//! # Design Decisions
//! - The two modes share no state besides the transport
//! - Per-request failures never leave the request that caused them
//! - No retries; a failed dispatch is terminal for that request

pub mod forward;
pub mod reverse;

pub use forward::ForwardProxy;
pub use reverse::{
    multiple_hosts_reverse_proxy, parse_targets, Director, ReverseProxy, ReverseProxyError,
    TargetRewriter,
};
