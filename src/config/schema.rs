//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::load_balancer::{RandomSelector, RoundRobinSelector, TargetSelector};
use std::sync::Arc;

/// Root configuration for the proxy toolkit.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Forward proxy listener.
    pub forward: ForwardConfig,

    /// Reverse proxy listener and its static backend targets.
    pub reverse: ReverseConfig,

    /// Upstream transport timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Forward proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ForwardConfig {
    /// Serve the forward proxy.
    pub enabled: bool,

    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Remove hop-by-hop headers (Connection, Keep-Alive, ...) before relaying.
    pub strip_hop_by_hop: bool,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8080".to_string(),
            strip_hop_by_hop: false,
        }
    }
}

/// Reverse proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ReverseConfig {
    /// Serve the reverse proxy.
    pub enabled: bool,

    /// Bind address (e.g., "127.0.0.1:9090").
    pub bind_address: String,

    /// Backend base URLs, e.g. "http://localhost:9091".
    pub targets: Vec<String>,

    /// Target selection strategy.
    pub strategy: SelectionStrategy,
}

impl Default for ReverseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:9090".to_string(),
            targets: Vec::new(),
            strategy: SelectionStrategy::Random,
        }
    }
}

/// How the reverse proxy picks a backend for each request.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    #[default]
    Random,
    RoundRobin,
}

impl SelectionStrategy {
    /// Instantiate the selector for this strategy.
    pub fn build(self) -> Arc<dyn TargetSelector> {
        match self {
            SelectionStrategy::Random => Arc::new(RandomSelector::new()),
            SelectionStrategy::RoundRobin => Arc::new(RoundRobinSelector::new()),
        }
    }
}

/// Timeout configuration for the upstream transport.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upstream dispatch timeout (until response headers arrive) in seconds.
    pub request_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            idle_secs: 90,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}
