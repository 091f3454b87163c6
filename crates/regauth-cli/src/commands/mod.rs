//! CLI command implementations for the regauth token service.

pub mod check;
pub mod keys;
pub mod serve;
pub mod token;

use anyhow::Context;
use regauth_core::RegauthConfig;
use regauth_token::DefaultTokenGenerator;
use std::path::Path;

/// Load and validate the configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<RegauthConfig> {
    let config = RegauthConfig::load_with_context(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(config)
}

/// Load the signing key pair named by the `keys` config section.
pub fn load_generator(config: &RegauthConfig) -> anyhow::Result<DefaultTokenGenerator> {
    let (certificate, private_key) = config.key_paths()?;
    DefaultTokenGenerator::load(&certificate, &private_key).with_context(|| {
        format!(
            "Failed to load signing key from {} and {}",
            certificate.display(),
            private_key.display()
        )
    })
}
