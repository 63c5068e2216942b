//! Verification-Key Fetch
//!
//! The token-verification key lives in a Redis-compatible key-value store
//! under `jwt:secret`. It is read exactly once at startup; an unreachable
//! or empty store downgrades the server to dev mode rather than failing.

use redis::AsyncCommands;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::ServerConfig;

/// Key holding the token-verification secret.
pub const JWT_SECRET_KEY: &str = "jwt:secret";

/// How long to wait for the store before giving up.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Fetch the verification key. `None` means dev mode.
pub async fn fetch_jwt_secret(cfg: &ServerConfig) -> Option<String> {
    let url = connection_url(&cfg.redis_addr, cfg.redis_port, &cfg.redis_password);

    let client = match redis::Client::open(url) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "invalid secret store address");
            return None;
        }
    };

    let mut conn = match timeout(CONNECT_TIMEOUT, client.get_multiplexed_async_connection()).await {
        Ok(Ok(conn)) => conn,
        Ok(Err(e)) => {
            warn!(error = %e, "secret store unreachable");
            return None;
        }
        Err(_) => {
            warn!("secret store connection timed out");
            return None;
        }
    };

    match conn.get::<_, Option<String>>(JWT_SECRET_KEY).await {
        Ok(Some(secret)) if !secret.is_empty() => {
            info!("token verification key loaded");
            Some(secret)
        }
        Ok(_) => {
            warn!(key = JWT_SECRET_KEY, "verification key missing");
            None
        }
        Err(e) => {
            warn!(error = %e, "secret store read failed");
            None
        }
    }
}

/// Build the store URL. The password is only embedded when set.
fn connection_url(host: &str, port: u16, password: &str) -> String {
    if password.is_empty() {
        format!("redis://{host}:{port}/")
    } else {
        format!("redis://:{password}@{host}:{port}/")
    }
}
