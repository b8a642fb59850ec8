//! Route table: which handler serves which listener.
//!
//! # Responsibilities
//! - Build one Axum router per enabled proxy mode
//! - Attach per-request middleware (request ID, trace span)
//! - Hand the finished table to the server, which only binds and serves
//!
//! # Design Decisions
//! - Built once at startup from config, immutable afterwards
//! - No global registration; tests build tables directly

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request, Response},
    Router,
};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::headers::X_REQUEST_ID;
use crate::http::response::health;
use crate::http::transport::Transport;
use crate::proxy::{
    multiple_hosts_reverse_proxy, parse_targets, ForwardProxy, ReverseProxy, ReverseProxyError,
};

/// Path answered locally on the forward listener for origin-form requests.
pub const HEALTH_PATH: &str = "/health";

/// Which proxy a listener serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyMode {
    Forward,
    Reverse,
}

impl ProxyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyMode::Forward => "forward",
            ProxyMode::Reverse => "reverse",
        }
    }
}

impl fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A listener address and the router serving it.
#[derive(Debug)]
pub struct Route {
    pub mode: ProxyMode,
    pub bind_address: String,
    pub router: Router,
}

/// The complete set of routes served by the process.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table for every enabled mode, sharing one transport.
    ///
    /// Fails when the reverse proxy is enabled without valid targets.
    pub fn from_config<T>(config: &ProxyConfig, transport: T) -> Result<Self, ReverseProxyError>
    where
        T: Transport + Clone,
    {
        let mut table = Self::new();

        if config.forward.enabled {
            let proxy = ForwardProxy::new(transport.clone())
                .with_strip_hop_by_hop(config.forward.strip_hop_by_hop);
            table.insert(
                ProxyMode::Forward,
                config.forward.bind_address.clone(),
                forward_router(proxy),
            );
        }

        if config.reverse.enabled {
            let targets = parse_targets(config.reverse.targets.as_slice())?;
            let proxy =
                multiple_hosts_reverse_proxy(targets, config.reverse.strategy.build(), transport)?;
            table.insert(
                ProxyMode::Reverse,
                config.reverse.bind_address.clone(),
                reverse_router(proxy),
            );
        }

        Ok(table)
    }

    /// Add or replace the route for `mode`.
    pub fn insert(&mut self, mode: ProxyMode, bind_address: String, router: Router) {
        self.routes.retain(|r| r.mode != mode);
        self.routes.push(Route {
            mode,
            bind_address,
            router,
        });
    }

    pub fn get(&self, mode: ProxyMode) -> Option<&Route> {
        self.routes.iter().find(|r| r.mode == mode)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn into_routes(self) -> Vec<Route> {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Router for the forward listener: every request is proxied, except an
/// origin-form `GET /health`.
pub fn forward_router<T: Transport>(proxy: ForwardProxy<T>) -> Router {
    let router = Router::new()
        .fallback(forward_handler::<T>)
        .with_state(Arc::new(proxy));
    with_request_layers(router, ProxyMode::Forward)
}

/// Router for the reverse listener: every request goes to a backend.
pub fn reverse_router<T: Transport>(proxy: ReverseProxy<T>) -> Router {
    let router = Router::new()
        .fallback(reverse_handler::<T>)
        .with_state(Arc::new(proxy));
    with_request_layers(router, ProxyMode::Reverse)
}

fn with_request_layers(router: Router, mode: ProxyMode) -> Router {
    router
        .layer(
            TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(&X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "proxy_request",
                    mode = %mode,
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}

async fn forward_handler<T: Transport>(
    State(proxy): State<Arc<ForwardProxy<T>>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response<Body> {
    if is_local_health_check(&request) {
        return health();
    }
    proxy.handle(request, &peer.to_string()).await
}

async fn reverse_handler<T: Transport>(
    State(proxy): State<Arc<ReverseProxy<T>>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response<Body> {
    proxy.handle(request, &peer.to_string()).await
}

fn is_local_health_check(request: &Request<Body>) -> bool {
    request.uri().authority().is_none()
        && request.method() == Method::GET
        && request.uri().path() == HEALTH_PATH
}
