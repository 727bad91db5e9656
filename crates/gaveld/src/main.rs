//! gaveld: Gavel auction node daemon.

use anyhow::{Context, Result};

use gavel_api::ApiState;
use gavel_core::config::GavelConfig;
use gavel_core::identity::{NodeIdentity, SeedStore};
use gavel_services::{start_node, NodeSettings};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = GavelConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = GavelConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        GavelConfig::default()
    });

    // Identity
    let store = SeedStore::open(&config.identity.seed_store_path);
    let identity = NodeIdentity::load_or_create(&store)
        .with_context(|| format!("failed to load seeds from {}", store.path().display()))?;
    tracing::info!(
        peer_id = %identity.peer_id,
        discovery_key = %identity.discovery_key(),
        "identity ready"
    );

    // Listener, agent, heartbeat and membership timers
    let node = start_node(NodeSettings {
        identity: identity.peer_id.clone(),
        listen_addr: config.network.listen_addr.clone(),
        advertise_addr: config.network.advertise_addr.clone(),
        directory_addr: config.network.directory_addr.clone(),
        timing: config.timing.clone(),
    })
    .await
    .with_context(|| format!("failed to bind {}", config.network.listen_addr))?;

    let shutdown_tx = node.shutdown_sender();
    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // Operator API
    let api_state = ApiState {
        agent: node.agent().clone(),
        discovery_key: identity.discovery_key(),
        shutdown_tx: shutdown_tx.clone(),
    };
    let api_port = config.network.api_port;
    let api_shutdown = node.subscribe();
    let mut api_task = tokio::spawn(async move {
        if let Err(e) = gavel_api::serve(api_state, api_port, api_shutdown).await {
            tracing::error!(error = %e, "API server failed");
        }
    });

    let mut shutdown_rx = node.subscribe();
    let api_exited = tokio::select! {
        _ = shutdown_rx.recv() => { tracing::info!("shutting down"); false }
        _ = &mut api_task      => { tracing::warn!("API task exited"); true }
    };

    node.shutdown().await;
    if !api_exited {
        let _ = api_task.await;
    }
    tracing::info!("gaveld stopped");
    Ok(())
}
