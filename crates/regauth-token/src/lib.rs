//! # regauth-token
//!
//! Protocol layer of the registry token-authentication flow.
//!
//! This crate provides functionality for:
//! - Parsing the closed action vocabulary (`pull`, `push`, `catalog`, `admin`, `*`)
//! - Parsing `type:name:actions` scope strings
//! - Extracting an [`AuthorizationRequest`] from transport query parameters
//! - Loading the signing key pair from a certificate and private key
//! - Issuing compact signed tokens (`header.claims.signature`)
//!
//! ## Issuance Flow
//!
//! | Step | Performed By | Produces |
//! |------|--------------|----------|
//! | Extract | [`AuthorizationRequest::from_params`] | Account, service, scope |
//! | Authenticate | [`Authenticator`] (external policy) | Success or failure |
//! | Authorize | [`Authorizer`] (external policy) | Granted [`ActionSet`] |
//! | Issue | [`TokenGenerator`] | Signed [`Token`] |
//!
//! The generator re-checks that the granted actions cover the requested ones,
//! so a faulty authorizer can never widen a token past what it returned.

pub mod action;
pub mod auth;
pub mod claims;
pub mod error;
pub mod keys;
pub mod request;
pub mod scope;
pub mod token;

pub use action::{ActionSet, ActionType};
pub use auth::{AllowAllAuthenticator, AllowAllAuthorizer, Authenticator, Authorizer, RequestContext};
pub use claims::{ClaimSet, Header, ResourceActions, SigningAlgorithm};
pub use error::{ErrorKind, RegistryAuthError};
pub use keys::KeyPair;
pub use request::{AccessType, AuthorizationRequest, ParamSource};
pub use scope::{Scope, ScopeType, normalize_name};
pub use token::{
    DefaultTokenGenerator, Token, TokenGenerator, TokenInfo, TokenOptions,
    inspect_token_unverified,
};
