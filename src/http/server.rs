//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the route table from configuration (fails fast on bad targets)
//! - Bind one listener per route
//! - Serve every route concurrently with peer address info
//! - Stop accepting and drain in-flight requests on shutdown

use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::config::ProxyConfig;
use crate::http::transport::HyperTransport;
use crate::lifecycle::Shutdown;
use crate::proxy::ReverseProxyError;
use crate::routing::{ProxyMode, RouteTable};

/// Error type for server startup and serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {mode} listener on {address}: {source}")]
    Bind {
        mode: ProxyMode,
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no listener provided for the {0} proxy")]
    MissingListener(ProxyMode),

    #[error("{mode} listener failed: {source}")]
    Serve {
        mode: ProxyMode,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    ReverseProxy(#[from] ReverseProxyError),

    #[error("listener task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// HTTP server for the forward and reverse proxies.
#[derive(Debug)]
pub struct HttpServer {
    routes: RouteTable,
}

impl HttpServer {
    /// Create a server for every enabled mode, sharing one pooled transport.
    pub fn new(config: &ProxyConfig) -> Result<Self, ServerError> {
        let transport = HyperTransport::new(&config.timeouts);
        let routes = RouteTable::from_config(config, transport)?;
        Ok(Self { routes })
    }

    /// Serve a prebuilt route table.
    pub fn from_routes(routes: RouteTable) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Bind every configured address, then serve until shutdown.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), ServerError> {
        let mut listeners = HashMap::new();
        for route in self.routes.routes() {
            let listener = TcpListener::bind(&route.bind_address)
                .await
                .map_err(|source| ServerError::Bind {
                    mode: route.mode,
                    address: route.bind_address.clone(),
                    source,
                })?;
            listeners.insert(route.mode, listener);
        }
        self.serve(listeners, shutdown).await
    }

    /// Serve on already-bound listeners, one per route mode.
    ///
    /// Returns when every listener has drained after shutdown, or as soon as
    /// one of them fails.
    pub async fn serve(
        self,
        mut listeners: HashMap<ProxyMode, TcpListener>,
        shutdown: Shutdown,
    ) -> Result<(), ServerError> {
        let mut tasks = JoinSet::new();

        for route in self.routes.into_routes() {
            let mode = route.mode;
            let listener = listeners
                .remove(&mode)
                .ok_or(ServerError::MissingListener(mode))?;
            let address = listener
                .local_addr()
                .map_err(|source| ServerError::Serve { mode, source })?;

            tracing::info!(mode = %mode, address = %address, "Listening for connections");

            let app = route
                .router
                .into_make_service_with_connect_info::<SocketAddr>();
            let signal = shutdown.notified();

            tasks.spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(signal)
                    .await
                    .map_err(|source| ServerError::Serve { mode, source })?;
                tracing::info!(mode = %mode, "Listener stopped");
                Ok::<_, ServerError>(())
            });
        }

        while let Some(result) = tasks.join_next().await {
            result??;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
