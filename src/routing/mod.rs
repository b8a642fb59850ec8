//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyConfig (at startup)
//!     → table.rs: one Route per enabled mode
//!         forward: bind_address → ForwardProxy router
//!         reverse: bind_address → ReverseProxy router
//!     → HttpServer binds each address and serves its router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - One listener per mode; a listener never serves both

pub mod table;

pub use table::{forward_router, reverse_router, ProxyMode, Route, RouteTable, HEALTH_PATH};
