mod error;
mod routes;
mod state;
mod utils;

use std::{net::SocketAddr, sync::Arc};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voting_cli::{KeypairWallet, SyncConfig, Synchronizer};

use crate::{
    state::AppState,
    utils::{client_config_from_env, env_parse},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Ballot Tally Service");

    let config = client_config_from_env();
    let port: u16 = env_parse("PORT", 3000);

    let wallet = Arc::new(KeypairWallet::new(&config));
    let sync = Synchronizer::new(wallet, SyncConfig::from(&config));
    // The service still serves state without a wallet, POST /connect retries.
    if let Err(err) = sync.connect().await {
        warn!("Starting without a wallet session: {}", err);
    }
    let _wallet_task = sync.watch_wallet();

    let app = routes::router(AppState::new(sync.clone()));

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sync.disconnect();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", err);
    }
    info!("Shutting down");
}
