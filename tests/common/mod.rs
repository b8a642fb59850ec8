//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Request, Response, StatusCode},
    Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

use proxy_toolkit::config::ProxyConfig;
use proxy_toolkit::lifecycle::Shutdown;
use proxy_toolkit::routing::ProxyMode;
use proxy_toolkit::HttpServer;

/// Response header carrying the X-Forwarded-For value the backend received.
pub const SEEN_FORWARDED_FOR: &str = "x-seen-forwarded-for";
/// Response header carrying the path and query the backend received.
pub const SEEN_URI: &str = "x-seen-uri";
/// Response header carrying the method the backend received.
pub const SEEN_METHOD: &str = "x-seen-method";

/// Start a mock backend that answers every request with `name` as the body
/// and reports what it received in `x-seen-*` headers.
pub async fn start_mock_backend(name: &'static str) -> SocketAddr {
    let app = Router::new().fallback(move |request: Request<Body>| async move {
        echo(name, request.method().as_str(), request.uri().to_string(), request.headers())
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn echo(name: &'static str, method: &str, uri: String, headers: &HeaderMap) -> Response<Body> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(SEEN_FORWARDED_FOR, forwarded)
        .header(SEEN_URI, uri)
        .header(SEEN_METHOD, method)
        .header("set-cookie", "a=1")
        .header("set-cookie", "b=2")
        .body(Body::from(name))
        .unwrap()
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running proxy server and the addresses of its listeners.
pub struct RunningProxy {
    pub addrs: HashMap<ProxyMode, SocketAddr>,
    pub shutdown: Shutdown,
}

impl RunningProxy {
    pub fn url(&self, mode: ProxyMode) -> String {
        format!("http://{}", self.addrs[&mode])
    }
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `config` on ephemeral ports, one per enabled mode.
pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let server = HttpServer::new(&config).unwrap();

    let mut listeners = HashMap::new();
    let mut addrs = HashMap::new();
    for route in server.routes().routes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        addrs.insert(route.mode, listener.local_addr().unwrap());
        listeners.insert(route.mode, listener);
    }

    let shutdown = Shutdown::new();
    tokio::spawn(server.serve(listeners, shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;

    RunningProxy { addrs, shutdown }
}

/// Client that talks to the listeners directly.
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Client that sends every plain-HTTP request through `proxy_url`.
pub fn proxied_client(proxy_url: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .proxy(reqwest::Proxy::http(proxy_url).unwrap())
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
