//! Reverse proxy.
//!
//! # Responsibilities
//! - Generic engine: run a director over the request, dispatch, relay
//! - Spread requests over a static list of backend targets
//!
//! # Design Decisions
//! - The director only rewrites the destination; dispatch, error translation
//!   and streaming live in the engine and are identical for every director
//! - Target choice is delegated to a [`TargetSelector`] so strategies can be
//!   swapped without touching the engine
//! - An empty target list is rejected when the proxy is built
//! - A director that cannot point the request at a backend aborts it with 502;
//!   the client's own URI is never dispatched

use axum::body::Body;
use axum::http::{request::Parts, Request, Response, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::http::headers::{append_forwarded_for, split_host_port, strip_hop_by_hop};
use crate::http::request::outbound_request;
use crate::http::response::{bad_gateway, relay};
use crate::http::transport::Transport;
use crate::load_balancer::{BackendTarget, TargetError, TargetSelector};
use crate::observability::metrics;

const MODE: &str = "reverse";

/// Error type for reverse proxy construction.
#[derive(Debug, thiserror::Error)]
pub enum ReverseProxyError {
    #[error("reverse proxy needs at least one backend target")]
    NoTargets,

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("failed to rewrite request for backend {backend}: {source}")]
    Rewrite {
        backend: String,
        #[source]
        source: axum::http::Error,
    },
}

/// Rewrites the outbound request parts in place before dispatch.
pub type Director = Box<dyn Fn(&mut Parts) -> Result<(), ReverseProxyError> + Send + Sync>;

/// Generic reverse proxy engine.
pub struct ReverseProxy<T> {
    director: Director,
    transport: T,
}

impl<T> fmt::Debug for ReverseProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverseProxy").finish_non_exhaustive()
    }
}

impl<T: Transport> ReverseProxy<T> {
    pub fn new<D>(director: D, transport: T) -> Self
    where
        D: Fn(&mut Parts) -> Result<(), ReverseProxyError> + Send + Sync + 'static,
    {
        Self {
            director: Box::new(director),
            transport,
        }
    }

    /// Proxy one inbound request; `remote_addr` is the peer's `host:port`.
    pub async fn handle(&self, inbound: Request<Body>, remote_addr: &str) -> Response<Body> {
        let start = Instant::now();
        let (mut parts, body) = inbound.into_parts();
        let original_uri = parts.uri.clone();

        if let Err(e) = (self.director)(&mut parts) {
            tracing::warn!(uri = %original_uri, error = %e, "Director rejected request");
            metrics::record_upstream_error(MODE);
            metrics::record_request(MODE, StatusCode::BAD_GATEWAY.as_u16(), start);
            return bad_gateway();
        }

        let mut headers = parts.headers.clone();
        strip_hop_by_hop(&mut headers);
        if let Some(client_ip) = split_host_port(remote_addr) {
            append_forwarded_for(&mut headers, client_ip);
        }

        let outbound = outbound_request(&parts, headers, body);

        tracing::debug!(
            method = %parts.method,
            uri = %original_uri,
            upstream = %parts.uri,
            remote_addr,
            "Proxying request"
        );

        match self.transport.round_trip(outbound).await {
            Ok(upstream) => {
                metrics::record_request(MODE, upstream.status().as_u16(), start);
                relay(upstream, true)
            }
            Err(e) => {
                tracing::warn!(upstream = %parts.uri, error = %e, "Upstream dispatch failed");
                metrics::record_upstream_error(MODE);
                metrics::record_request(MODE, StatusCode::BAD_GATEWAY.as_u16(), start);
                bad_gateway()
            }
        }
    }
}

/// Picks a backend per request and points the request at it.
#[derive(Debug, Clone)]
pub struct TargetRewriter {
    targets: Arc<[BackendTarget]>,
    selector: Arc<dyn TargetSelector>,
}

impl TargetRewriter {
    pub fn new(
        targets: Vec<BackendTarget>,
        selector: Arc<dyn TargetSelector>,
    ) -> Result<Self, ReverseProxyError> {
        if targets.is_empty() {
            return Err(ReverseProxyError::NoTargets);
        }
        Ok(Self {
            targets: targets.into(),
            selector,
        })
    }

    pub fn targets(&self) -> &[BackendTarget] {
        &self.targets
    }

    pub fn strategy(&self) -> &'static str {
        self.selector.name()
    }

    /// Choose the target for one request.
    pub fn select(&self) -> &BackendTarget {
        let index = self.selector.select(&self.targets);
        &self.targets[index % self.targets.len()]
    }

    /// Overwrite scheme, authority and path of `parts.uri` with a chosen
    /// target. Method and query string are left as they are.
    ///
    /// On error `parts` is untouched and must not be dispatched.
    pub fn rewrite(&self, parts: &mut Parts) -> Result<&BackendTarget, ReverseProxyError> {
        let target = self.select();
        parts.uri = target
            .rewrite_uri(&parts.uri)
            .map_err(|source| ReverseProxyError::Rewrite {
                backend: target.to_string(),
                source,
            })?;
        Ok(target)
    }
}

/// Parse backend base URLs, failing on the first invalid one.
pub fn parse_targets<S: AsRef<str>>(urls: &[S]) -> Result<Vec<BackendTarget>, ReverseProxyError> {
    urls.iter()
        .map(|url| BackendTarget::parse(url.as_ref()).map_err(ReverseProxyError::from))
        .collect()
}

/// Build a reverse proxy spreading requests over `targets` with `selector`.
pub fn multiple_hosts_reverse_proxy<T: Transport>(
    targets: Vec<BackendTarget>,
    selector: Arc<dyn TargetSelector>,
    transport: T,
) -> Result<ReverseProxy<T>, ReverseProxyError> {
    let rewriter = TargetRewriter::new(targets, selector)?;

    tracing::info!(
        targets = rewriter.targets().len(),
        strategy = rewriter.strategy(),
        "Reverse proxy configured"
    );

    Ok(ReverseProxy::new(
        move |parts: &mut Parts| {
            let target = rewriter.rewrite(parts)?;
            tracing::debug!(backend = %target, "Selected backend target");
            metrics::record_target_selection(target.to_string());
            Ok(())
        },
        transport,
    ))
}
