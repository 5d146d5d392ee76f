//! modwatch-web - HTTP API and realtime layer for modwatch

pub mod assets;
pub mod channel;
pub mod router;

pub use router::{create_router, AppState};

use anyhow::Result;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Run the web server
pub async fn run(state: AppState, addr: SocketAddr) -> Result<()> {
    let router = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
