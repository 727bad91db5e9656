//! gavel-directory: presence directory daemon.
//!
//! Accepts heartbeats, answers membership queries and expires silent peers.

use anyhow::{Context, Result};

use gavel_core::config::GavelConfig;
use gavel_core::identity::{NodeIdentity, SeedStore};
use gavel_services::{start_directory, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = GavelConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = GavelConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        GavelConfig::default()
    });

    let store = SeedStore::open(&config.directory.seed_store_path);
    let identity = NodeIdentity::load_or_create(&store)
        .with_context(|| format!("failed to load seeds from {}", store.path().display()))?;
    tracing::info!(
        peer_id = %identity.peer_id,
        discovery_key = %identity.discovery_key(),
        "directory identity ready"
    );

    let listen_addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.directory.listen_addr.clone());
    let directory = start_directory(&listen_addr, &config.timing, SystemClock)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;

    {
        let shutdown = directory.shutdown_sender();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    let mut shutdown_rx = directory.subscribe();
    let _ = shutdown_rx.recv().await;
    tracing::info!(peers = directory.presence().len(), "shutting down");
    directory.shutdown().await;
    Ok(())
}
