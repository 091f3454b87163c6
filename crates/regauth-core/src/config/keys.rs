//! Signing key configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location of the signing certificate and private key (PEM files).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KeysConfig {
    /// Path to the certificate whose public key verifies issued tokens.
    #[serde(default)]
    pub certificate: Option<PathBuf>,

    /// Path to the matching private key.
    #[serde(default)]
    pub private_key: Option<PathBuf>,

    /// Environment variable holding a certificate path; takes precedence over `certificate`.
    #[serde(default)]
    pub certificate_env: Option<String>,

    /// Environment variable holding a private key path; takes precedence over `private_key`.
    #[serde(default)]
    pub private_key_env: Option<String>,
}

impl KeysConfig {
    /// Resolve the certificate path from environment or config.
    pub fn resolve_certificate(&self) -> Option<PathBuf> {
        resolve_path(self.certificate_env.as_deref(), self.certificate.as_deref())
    }

    /// Resolve the private key path from environment or config.
    pub fn resolve_private_key(&self) -> Option<PathBuf> {
        resolve_path(self.private_key_env.as_deref(), self.private_key.as_deref())
    }

    /// Make configured (not environment-supplied) relative paths relative to `base_dir`.
    pub fn rebase(&mut self, base_dir: &Path) {
        for path in [&mut self.certificate, &mut self.private_key].into_iter().flatten() {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }
}

fn resolve_path(env_var: Option<&str>, configured: Option<&Path>) -> Option<PathBuf> {
    // Try environment variable first
    if let Some(value) = env_var
        .and_then(|var| std::env::var(var).ok())
        .filter(|value| !value.is_empty())
    {
        return Some(PathBuf::from(value));
    }

    configured.map(Path::to_path_buf)
}
