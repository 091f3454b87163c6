// Configuration types shared across all regauth crates
pub mod config;

pub use config::{ConfigError, KeysConfig, RegauthConfig, ServerConfig, TokenConfig};
