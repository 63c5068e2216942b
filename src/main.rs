//! Rumble Game Server
//!
//! Authoritative realtime server for the Rumble 2D platformer.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use rumble_server::network::server::Gateway;
use rumble_server::storage::secrets::fetch_jwt_secret;
use rumble_server::{ServerConfig, VERSION};

#[tokio::main]
async fn main() {
    let cfg = ServerConfig::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cfg.tracing_level())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Rumble Server v{}", VERSION);
    info!(
        port = cfg.port,
        tick_rate = cfg.tick_rate,
        log_level = %cfg.log_level,
        "configuration"
    );

    let jwt_secret = fetch_jwt_secret(&cfg).await;
    if jwt_secret.is_none() {
        warn!("no verification key, running in dev mode with ephemeral player ids");
    }

    let gateway = Arc::new(Gateway::new(cfg, jwt_secret));
    if let Err(e) = gateway.run().await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
