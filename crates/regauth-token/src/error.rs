//! Error types for the token crate.

use crate::action::ActionSet;
use thiserror::Error;

/// Errors that can occur while parsing requests or issuing tokens.
#[derive(Debug, Error)]
pub enum RegistryAuthError {
    /// Action string is not in the closed vocabulary.
    #[error("unknown action: {0:?}")]
    InvalidAction(String),

    /// Scope type is neither `repository` nor `registry`.
    #[error("unknown scope type: {0:?}")]
    InvalidScopeType(String),

    /// Scope string does not have exactly three `:`-separated fields.
    #[error("invalid scope: {0:?}")]
    InvalidScope(String),

    /// Required query parameter is missing or empty.
    #[error("{0} is required")]
    MissingParameter(&'static str),

    /// Access type is recognized but not implemented.
    #[error("{0} access type is not supported")]
    UnsupportedAccessType(String),

    /// Requested service is not the audience tokens are issued for.
    #[error("service {service:?} does not match audience {audience:?}")]
    AudienceMismatch { service: String, audience: String },

    /// Granted actions do not cover every requested action.
    #[error("requested actions [{requested}] are not covered by granted actions [{granted}]")]
    PermissionDenied {
        requested: ActionSet,
        granted: ActionSet,
    },

    /// Issuance options cannot produce a well-formed token.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The generator is missing required configuration (e.g. a key pair).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Signing failed or produced an unexpected algorithm.
    #[error("signing error: {0}")]
    Signing(String),

    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The authorizer refused the request.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Compact token could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Certificate public key does not belong to the private key.
    #[error("certificate public key does not match private key")]
    KeyMismatch,

    /// Key material is unreadable or of an unsupported type.
    #[error("unsupported key: {0}")]
    UnsupportedKey(String),

    /// IO error (reading certificates and keys).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fieldless discriminant of [`RegistryAuthError`], for matching and mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAction,
    InvalidScopeType,
    InvalidScope,
    MissingParameter,
    UnsupportedAccessType,
    AudienceMismatch,
    PermissionDenied,
    InvalidArgument,
    Configuration,
    Signing,
    AuthenticationFailed,
    AuthorizationDenied,
    MalformedToken,
    KeyMismatch,
    UnsupportedKey,
    Io,
}

impl RegistryAuthError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAction(_) => ErrorKind::InvalidAction,
            Self::InvalidScopeType(_) => ErrorKind::InvalidScopeType,
            Self::InvalidScope(_) => ErrorKind::InvalidScope,
            Self::MissingParameter(_) => ErrorKind::MissingParameter,
            Self::UnsupportedAccessType(_) => ErrorKind::UnsupportedAccessType,
            Self::AudienceMismatch { .. } => ErrorKind::AudienceMismatch,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Signing(_) => ErrorKind::Signing,
            Self::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            Self::AuthorizationDenied(_) => ErrorKind::AuthorizationDenied,
            Self::MalformedToken(_) => ErrorKind::MalformedToken,
            Self::KeyMismatch => ErrorKind::KeyMismatch,
            Self::UnsupportedKey(_) => ErrorKind::UnsupportedKey,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_message() {
        let err = RegistryAuthError::MissingParameter("scope");
        assert_eq!(err.kind(), ErrorKind::MissingParameter);
        assert_eq!(err.to_string(), "scope is required");

        let err = RegistryAuthError::Signing("boom".into());
        assert_eq!(err.kind(), ErrorKind::Signing);
    }
}
