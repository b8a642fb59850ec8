//! proxy-toolkit
//!
//! Runs the forward proxy, the reverse proxy, or both, from one TOML file.
//!
//! ```text
//!   client ──▶ forward listener ──▶ ForwardProxy ──┐
//!                                                  ├──▶ pooled transport ──▶ upstream
//!   client ──▶ reverse listener ──▶ ReverseProxy ──┘
//!                                   (random target)
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use proxy_toolkit::config::{load_config, validate_config, ProxyConfig};
use proxy_toolkit::lifecycle::{wait_for_signal, Shutdown};
use proxy_toolkit::observability::{logging, metrics};
use proxy_toolkit::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "proxy-toolkit")]
#[command(about = "Minimal forward and reverse HTTP proxy", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Forward proxy listen address
    #[arg(short, long)]
    address: Option<String>,

    /// Forward proxy listen port
    #[arg(short, long)]
    port: Option<u16>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut ProxyConfig) {
        if self.address.is_none() && self.port.is_none() {
            return;
        }
        let current = config.forward.bind_address.as_str();
        let (host, port) = current.rsplit_once(':').unwrap_or((current, "8080"));
        let host = match self.address.as_deref() {
            Some(addr) if addr.contains(':') && !addr.starts_with('[') => format!("[{addr}]"),
            Some(addr) => addr.to_string(),
            None => host.to_string(),
        };
        let port = self.port.map(|p| p.to_string()).unwrap_or_else(|| port.to_string());
        config.forward.bind_address = format!("{host}:{port}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => ProxyConfig::default(),
    };
    cli.apply_overrides(&mut config);

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "proxy-toolkit starting");

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(error = %error, "Invalid configuration");
        }
        return ExitCode::FAILURE;
    }

    tracing::info!(
        forward_enabled = config.forward.enabled,
        forward_address = %config.forward.bind_address,
        reverse_enabled = config.reverse.enabled,
        reverse_address = %config.reverse.bind_address,
        reverse_targets = config.reverse.targets.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = match HttpServer::new(&config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build proxy routes");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    if let Err(e) = server.run(shutdown).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
