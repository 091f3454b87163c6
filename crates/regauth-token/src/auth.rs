//! Authentication and authorization seams.
//!
//! Credential checks and access-control decisions live outside this crate.
//! The server holds both collaborators as trait objects; the allow-all
//! implementations here exist for development only.

use crate::action::ActionSet;
use crate::error::RegistryAuthError;
use crate::request::AuthorizationRequest;
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Once;

/// Transport details available to policy implementations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub remote_addr: Option<IpAddr>,
    pub path: Option<String>,
}

/// Verifies client credentials.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Succeeds when `password` is valid for `user`, otherwise fails with
    /// [`RegistryAuthError::AuthenticationFailed`].
    async fn authenticate(
        &self,
        ctx: &RequestContext,
        user: &str,
        password: &str,
    ) -> Result<(), RegistryAuthError>;
}

/// Decides which of the requested actions are granted.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Returns the granted actions, or [`RegistryAuthError::AuthorizationDenied`].
    async fn authorize(
        &self,
        ctx: &RequestContext,
        request: &AuthorizationRequest,
    ) -> Result<ActionSet, RegistryAuthError>;
}

static ALLOW_ALL_AUTHENTICATOR_WARNING: Once = Once::new();
static ALLOW_ALL_AUTHORIZER_WARNING: Once = Once::new();

/// Accepts any credentials.
#[derive(Debug, Clone, Copy)]
pub struct AllowAllAuthenticator;

impl AllowAllAuthenticator {
    pub fn new() -> Self {
        ALLOW_ALL_AUTHENTICATOR_WARNING.call_once(|| {
            tracing::warn!("Allow-all authenticator in use: every credential is accepted");
        });
        Self
    }
}

impl Default for AllowAllAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for AllowAllAuthenticator {
    async fn authenticate(
        &self,
        _ctx: &RequestContext,
        user: &str,
        _password: &str,
    ) -> Result<(), RegistryAuthError> {
        tracing::debug!(user = %user, "Allow-all authentication");
        Ok(())
    }
}

/// Grants exactly the requested actions.
#[derive(Debug, Clone, Copy)]
pub struct AllowAllAuthorizer;

impl AllowAllAuthorizer {
    pub fn new() -> Self {
        ALLOW_ALL_AUTHORIZER_WARNING.call_once(|| {
            tracing::warn!("Allow-all authorizer in use: every requested action is granted");
        });
        Self
    }
}

impl Default for AllowAllAuthorizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authorizer for AllowAllAuthorizer {
    async fn authorize(
        &self,
        _ctx: &RequestContext,
        request: &AuthorizationRequest,
    ) -> Result<ActionSet, RegistryAuthError> {
        tracing::debug!(
            account = %request.account,
            scope = %request.scope(),
            "Allow-all authorization"
        );
        Ok(request.actions.clone())
    }
}
