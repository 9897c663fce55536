//! Alert relay service binary.
//!
//! Serves the Pub/Sub push endpoint, or relays a single alert from a file or
//! stdin.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use alert_relay::{server, AlertEvent, Config};

/// Relay Pub/Sub alerts to Slack
#[derive(Parser)]
#[command(name = "alert-relay")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log output format (json or text)
    #[arg(long, env = "LOG_FORMAT", default_value = "text", ignore_case = true, global = true)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the Pub/Sub push endpoint
    Serve {
        /// Listen port (falls back to 8080)
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
    /// Relay one alert read from a file, or stdin when no file is given
    Send {
        /// File holding the alert text
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let json_logs = cli.log_format == LogFormat::Json;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(json_logs.then(|| fmt::layer().json()))
        .with((!json_logs).then(fmt::layer))
        .with(EnvFilter::from_default_env().add_directive("alert_relay=info".parse()?))
        .init();

    let config = Config::default();
    let relay = config
        .build_relay()
        .context("Failed to configure alert relay")?;

    info!(
        secret = %config.secret_resource().unwrap_or_else(|| config.secret_name.clone()),
        backend = %config.secret_backend,
        thread_token = %config.thread_token,
        "Alert relay configured"
    );

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            let app = server::build_router(server::AppState { relay });

            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = TcpListener::bind(addr)
                .await
                .context("Failed to bind to address")?;

            info!(port, "Alert relay listening");

            axum::serve(listener, app).await.context("Server error")?;
        }
        Commands::Send { file } => {
            let data = match file {
                Some(path) => tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut data = Vec::new();
                    tokio::io::stdin()
                        .read_to_end(&mut data)
                        .await
                        .context("Failed to read stdin")?;
                    data
                }
            };

            let outcome = relay.handle(AlertEvent::new(data)).await;
            info!(delivered = outcome.is_delivered(), "Done");
        }
    }

    Ok(())
}
