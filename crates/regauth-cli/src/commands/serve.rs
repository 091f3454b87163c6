//! `regauth serve` command implementation.

use super::{load_config, load_generator};
use regauth_server::{AppState, TokenServer};
use std::path::Path;
use std::sync::Arc;

/// Load config and keys, then run the token endpoint until Ctrl-C.
pub async fn run(config_path: &Path, listen: Option<String>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(addr) = listen {
        config.server.listen_addr = addr;
    }

    let generator = load_generator(&config)?;
    tracing::info!(
        issuer = %config.token.issuer,
        audience = %config.token.audience,
        expires_in = config.token.expires_in,
        "Token issuance configured"
    );

    // No policy backend yet: every request is authenticated and fully granted.
    let state = AppState::new(config, Arc::new(generator));
    TokenServer::new(state).run().await?;
    Ok(())
}
