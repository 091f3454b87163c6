//! Configuration types for the regauth token service.
//!
//! Configuration is loaded from a single YAML file (`regauth.yaml` by default)
//! with three sections:
//!
//! - **server**: listener address, token endpoint path and auth realm
//! - **token**: issuer, audience and lifetime of issued tokens
//! - **keys**: certificate and private key used to sign tokens

pub mod keys;
pub mod server;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use keys::KeysConfig;
pub use server::ServerConfig;
pub use token::TokenConfig;

/// Config file used when neither `--config` nor [`CONFIG_ENV`] is given.
pub const DEFAULT_CONFIG_FILE: &str = "regauth.yaml";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "REGAUTH_CONFIG";

/// Complete regauth configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegauthConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Token issuance settings.
    #[serde(default)]
    pub token: TokenConfig,

    /// Signing key locations.
    #[serde(default)]
    pub keys: KeysConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegauthConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration, resolving key paths relative to the config file's directory.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        config.keys.rebase(&base_dir);
        Ok(config)
    }

    /// Check values that deserialize fine but cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.expires_in <= 0 {
            return Err(ConfigError::Config(format!(
                "token.expires_in must be positive, got {}",
                self.token.expires_in
            )));
        }
        if self.token.issuer.is_empty() {
            return Err(ConfigError::Config("token.issuer must not be empty".to_string()));
        }
        if self.token.audience.is_empty() {
            return Err(ConfigError::Config("token.audience must not be empty".to_string()));
        }
        if !self.server.token_path.starts_with('/') {
            return Err(ConfigError::Config(format!(
                "server.token_path must start with '/', got {:?}",
                self.server.token_path
            )));
        }
        Ok(())
    }

    /// Resolved certificate and private key paths; both are required to sign tokens.
    pub fn key_paths(&self) -> Result<(PathBuf, PathBuf), ConfigError> {
        let certificate = self
            .keys
            .resolve_certificate()
            .ok_or_else(|| ConfigError::Config("keys.certificate is not set".to_string()))?;
        let private_key = self
            .keys
            .resolve_private_key()
            .ok_or_else(|| ConfigError::Config("keys.private_key is not set".to_string()))?;
        Ok((certificate, private_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RegauthConfig::from_yaml("{}").unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:5001");
        assert_eq!(config.server.token_path, "/v1/registry/auth");
        assert_eq!(config.server.realm, "registry");
        assert!(!config.server.trust_forwarded_for);
        assert_eq!(config.token.issuer, "regauth");
        assert_eq!(config.token.audience, "registry");
        assert_eq!(config.token.expires_in, 300);
        assert!(!config.token.require_client_id);
        assert!(config.keys.certificate.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r#"
server:
  listen_addr: "127.0.0.1:8080"
token:
  issuer: "paca-node"
  expires_in: 3600
keys:
  certificate: /etc/regauth/token.crt
  private_key: /etc/regauth/token.key
"#;
        let config = RegauthConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.server.token_path, "/v1/registry/auth");
        assert_eq!(config.token.issuer, "paca-node");
        assert_eq!(config.token.audience, "registry");
        assert_eq!(config.token.expires_in, 3600);

        let (cert, key) = config.key_paths().unwrap();
        assert_eq!(cert, PathBuf::from("/etc/regauth/token.crt"));
        assert_eq!(key, PathBuf::from("/etc/regauth/token.key"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            "token:\n  expires_in: 0\n",
            "token:\n  expires_in: -5\n",
            "token:\n  issuer: \"\"\n",
            "token:\n  audience: \"\"\n",
            "server:\n  token_path: \"auth\"\n",
        ];

        for yaml in cases {
            let config = RegauthConfig::from_yaml(yaml).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::Config(_))),
                "expected {yaml:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            RegauthConfig::from_yaml("token:\n  expires_in: soon\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_missing_keys() {
        let config = RegauthConfig::default();
        assert!(matches!(config.key_paths(), Err(ConfigError::Config(_))));
    }

    #[test]
    fn test_load_with_context_rebases_key_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regauth.yaml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "keys:\n  certificate: certs/token.crt\n  private_key: /abs/token.key").unwrap();

        let config = RegauthConfig::load_with_context(&path).unwrap();
        let (cert, key) = config.key_paths().unwrap();
        assert_eq!(cert, dir.path().join("certs/token.crt"));
        assert_eq!(key, PathBuf::from("/abs/token.key"));
    }

    #[test]
    fn test_env_overrides_key_paths() {
        // SAFETY: We're in a test and controlling the environment
        unsafe {
            std::env::set_var("REGAUTH_TEST_CERT_PATH", "/run/secrets/token.crt");
        }

        let yaml = r#"
keys:
  certificate: certs/token.crt
  private_key: certs/token.key
  certificate_env: REGAUTH_TEST_CERT_PATH
  private_key_env: REGAUTH_TEST_UNSET_KEY_PATH
"#;
        let config = RegauthConfig::from_yaml(yaml).unwrap();
        let (cert, key) = config.key_paths().unwrap();
        assert_eq!(cert, PathBuf::from("/run/secrets/token.crt"));
        assert_eq!(key, PathBuf::from("certs/token.key"));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            RegauthConfig::load_with_context("/nonexistent/regauth.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
