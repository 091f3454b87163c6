//! Error types for the server crate.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use regauth_token::{ErrorKind, RegistryAuthError};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the token endpoint.
#[derive(Debug, Error)]
pub enum ServerError {
    /// No usable Basic credentials on the request.
    #[error("authentication required")]
    MissingCredentials { realm: String },

    /// The authenticator rejected the credentials.
    #[error("invalid username or password")]
    InvalidCredentials { realm: String },

    /// The `account` parameter names someone other than the authenticated user.
    #[error("account does not match authenticated user")]
    AccountMismatch,

    /// The query string could not be decoded.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Failure from request extraction, authorization or issuance.
    #[error(transparent)]
    Registry(#[from] RegistryAuthError),

    /// Failed to start the server.
    #[error("failed to start server: {0}")]
    StartupFailed(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// HTTP status for a core error kind.
pub fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidAction
        | ErrorKind::InvalidScopeType
        | ErrorKind::InvalidScope
        | ErrorKind::MissingParameter
        | ErrorKind::UnsupportedAccessType
        | ErrorKind::AudienceMismatch
        | ErrorKind::InvalidArgument
        | ErrorKind::MalformedToken => StatusCode::BAD_REQUEST,
        ErrorKind::AuthenticationFailed => StatusCode::UNAUTHORIZED,
        ErrorKind::AuthorizationDenied | ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::Configuration
        | ErrorKind::Signing
        | ErrorKind::KeyMismatch
        | ErrorKind::UnsupportedKey
        | ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::MissingCredentials { .. } | ServerError::InvalidCredentials { .. } => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::AccountMismatch | ServerError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ServerError::Registry(err) => status_for_kind(err.kind()),
            ServerError::StartupFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn realm(&self) -> Option<&str> {
        match self {
            ServerError::MissingCredentials { realm } | ServerError::InvalidCredentials { realm } => {
                Some(realm)
            }
            _ => None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side detail stays in the log.
        let comment = if status.is_server_error() {
            tracing::error!(error = %self, "Token request failed");
            None
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Token request rejected");
            Some(self.to_string())
        };

        let body = ErrorBody {
            code: status.as_u16(),
            message: status.canonical_reason().unwrap_or_default().to_string(),
            comment,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(challenge) = self
            .realm()
            .and_then(|realm| HeaderValue::from_str(&format!("Basic realm=\"{realm}\"")).ok())
        {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, challenge);
        }
        response
    }
}
