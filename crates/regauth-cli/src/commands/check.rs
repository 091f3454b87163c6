//! `regauth check` command implementation.
//!
//! Validates the configuration and loads the signing key exactly as `serve` would.

use super::{load_config, load_generator};
use std::path::Path;

/// What a successful check found.
#[derive(Debug, Clone)]
pub struct CheckSummary {
    pub algorithm: String,
    pub key_id: String,
    pub token_path: String,
    pub audience: String,
}

/// Validate config and keys, returning what the server would run with.
pub fn inspect_config(path: &Path) -> anyhow::Result<CheckSummary> {
    let config = load_config(path)?;
    let generator = load_generator(&config)?;
    let keypair = generator
        .keypair()
        .ok_or_else(|| anyhow::anyhow!("signing key pair is not loaded"))?;

    Ok(CheckSummary {
        algorithm: keypair.algorithm().to_string(),
        key_id: keypair.key_id().to_string(),
        token_path: config.server.token_path.clone(),
        audience: config.token.audience.clone(),
    })
}

pub fn run(path: &Path) -> anyhow::Result<()> {
    let summary = inspect_config(path)?;

    println!("✔ Configuration is valid: {}", path.display());
    println!("  Token endpoint: {}", summary.token_path);
    println!("  Audience:       {}", summary.audience);
    println!("  Algorithm:      {}", summary.algorithm);
    println!("  Key id:         {}", summary.key_id);
    Ok(())
}
