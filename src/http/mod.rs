//! HTTP plumbing shared by both proxies.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one listener per proxy mode)
//!     → [routing table picks the proxy handler]
//!     → request.rs + headers.rs (outbound copy, X-Forwarded-For)
//!     → transport.rs (pooled upstream round trip)
//!     → response.rs (relay status, headers, streamed body, or 502)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;
pub mod transport;

pub use headers::{X_FORWARDED_FOR, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
pub use transport::{HyperTransport, Transport, TransportError};
