//! Server application state.

use regauth_core::RegauthConfig;
use regauth_token::{
    AllowAllAuthenticator, AllowAllAuthorizer, Authenticator, Authorizer, TokenGenerator,
    TokenOptions,
};
use std::sync::Arc;

/// Shared application state for the token endpoint.
///
/// Everything here is immutable after startup, so handlers read it without locking.
#[derive(Clone)]
pub struct AppState {
    config: Arc<RegauthConfig>,
    generator: Arc<dyn TokenGenerator>,
    authenticator: Arc<dyn Authenticator>,
    authorizer: Arc<dyn Authorizer>,
}

impl AppState {
    /// Create state with the allow-all authenticator and authorizer.
    pub fn new(config: RegauthConfig, generator: Arc<dyn TokenGenerator>) -> Self {
        Self {
            config: Arc::new(config),
            generator,
            authenticator: Arc::new(AllowAllAuthenticator::new()),
            authorizer: Arc::new(AllowAllAuthorizer::new()),
        }
    }

    /// Replace the authenticator.
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Replace the authorizer.
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn config(&self) -> &RegauthConfig {
        &self.config
    }

    pub fn generator(&self) -> &dyn TokenGenerator {
        self.generator.as_ref()
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn authorizer(&self) -> &dyn Authorizer {
        self.authorizer.as_ref()
    }

    /// Issuance options from the `token` config section.
    pub fn token_options(&self) -> TokenOptions {
        TokenOptions {
            expires_in: self.config.token.expires_in,
            issuer: self.config.token.issuer.clone(),
            audience: self.config.token.audience.clone(),
        }
    }
}
