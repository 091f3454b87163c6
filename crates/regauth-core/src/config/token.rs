//! Token issuance configuration.

use serde::{Deserialize, Serialize};

/// Claims and lifetime applied to every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// `aud` claim. Requests must name this value as their `service`.
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Token lifetime in seconds.
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,

    /// Reject requests without a `client_id` parameter.
    #[serde(default)]
    pub require_client_id: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            audience: default_audience(),
            expires_in: default_expires_in(),
            require_client_id: false,
        }
    }
}

fn default_issuer() -> String {
    "regauth".to_string()
}

fn default_audience() -> String {
    "registry".to_string()
}

fn default_expires_in() -> i64 {
    300
}
