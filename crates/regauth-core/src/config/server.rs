//! HTTP listener configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the token endpoint listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind (host:port).
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Path the token endpoint is mounted at.
    #[serde(default = "default_token_path")]
    pub token_path: String,

    /// Realm advertised in `WWW-Authenticate` challenges.
    #[serde(default = "default_realm")]
    pub realm: String,

    /// Take the client address from `X-Forwarded-For` instead of the peer.
    /// Only enable behind a proxy that sets the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            token_path: default_token_path(),
            realm: default_realm(),
            trust_forwarded_for: false,
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:5001".to_string()
}

fn default_token_path() -> String {
    "/v1/registry/auth".to_string()
}

fn default_realm() -> String {
    "registry".to_string()
}
