use tokio::net::TcpListener;
use tracing::info;

mod broadcaster;
mod client;
mod config;
mod messages;
mod relay_coordinator;
mod role;
mod server;
#[cfg(test)]
mod test_utils;

use crate::config::ServerConfig;

/// Entry point: binds the listener and runs the relay until Ctrl-C
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("Server is running on {}", config.bind_addr());

    server::serve(listener, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await?;

    info!("Server stopped");
    Ok(())
}
