//! logdb-proxy
//!
//! Exposes a small Elasticsearch-like API and forwards it, signed, to the
//! Pandora logdb service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ routing ──▶ auth ──▶ upstream client ──▶ logdb
//!                     (CORS, dump)   (translate) (ak/sk)  (sign, send)
//!
//!     Client Response
//!     ◀────────────── relay ◀──────────────────────────── status, X-Reqid, body
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use logdb_proxy::config::{load_config, ProxyConfig};
use logdb_proxy::observability::{logging, metrics};
use logdb_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "logdb-proxy")]
#[command(about = "Elasticsearch-style proxy in front of the Pandora logdb API", long_about = None)]
struct Cli {
    /// Proxy config file (.toml, or legacy .json)
    #[arg(short = 'f', long = "config")]
    config: PathBuf,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = load_config(&cli.config);

    let level = cli
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|c| c.observability.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    logging::init_tracing(&level);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %cli.config.display(), error = %e, "config.Load failed");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "logdb-proxy failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.bind_address(),
        upstream = %config.upstream.url,
        response_timeout_secs = config.upstream.response_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: std::net::SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Held for the lifetime of the server; only Ctrl+C stops the binary.
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
