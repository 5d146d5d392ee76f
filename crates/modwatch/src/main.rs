//! modwatch - keyword moderation backend

use anyhow::{Context, Result};
use clap::Parser;
use modwatch_core::ModerationStore;
use modwatch_web::AppState;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "modwatch",
    version,
    about = "Keyword moderation backend with realtime chat bridge",
    long_about = "Serves the moderation HTTP API, the WebSocket chat bridge, and the\n\
                  static dashboard/extension assets from a single process.\n\
                  \n\
                  Examples:\n\
                    modwatch                                 # Listen on 127.0.0.1:5000\n\
                    modwatch --host 0.0.0.0 --port 8080      # Expose on the network\n\
                    modwatch --debug                         # Verbose logging\n\
                  \n\
                  Environment Variables:\n\
                    MODWATCH_HOST                            # Override listen address\n\
                    MODWATCH_PORT                            # Override listen port"
)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "MODWATCH_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port for the HTTP and WebSocket server
    #[arg(long, env = "MODWATCH_PORT", default_value = "5000")]
    port: u16,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Directory with the static dashboard bundle
    #[arg(long, default_value = "dashboard")]
    dashboard_dir: PathBuf,

    /// Directory with the browser-extension assets
    #[arg(long, default_value = "extension")]
    extension_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let state = AppState {
        store: Arc::new(ModerationStore::new()),
        dashboard_dir: cli.dashboard_dir,
        extension_dir: cli.extension_dir,
    };

    let addr = SocketAddr::new(cli.host, cli.port);
    tracing::info!(%addr, "Starting modwatch");
    modwatch_web::run(state, addr)
        .await
        .context("web server terminated")
}
