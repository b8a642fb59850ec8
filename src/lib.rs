//! Minimal HTTP proxy toolkit: a forward proxy and a random-target reverse proxy.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::{HttpServer, HyperTransport, Transport};
pub use lifecycle::Shutdown;
pub use proxy::{ForwardProxy, ReverseProxy};
