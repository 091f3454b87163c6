//! Request handlers for the token endpoint.

use crate::error::ServerError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regauth_token::{AuthorizationRequest, RegistryAuthError, RequestContext, Token};
use serde_json::json;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Liveness probe.
pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "regauth" }))
}

/// `GET {token_path}`: authenticate, authorize and issue a token.
pub async fn issue_token(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<Token>, ServerError> {
    let (parts, _) = request.into_parts();
    let config = state.config();
    let realm = config.server.realm.clone();

    let Some((user, password)) = basic_credentials(&parts.headers) else {
        return Err(ServerError::MissingCredentials { realm });
    };

    let ctx = RequestContext {
        remote_addr: client_ip(&parts, config.server.trust_forwarded_for),
        path: Some(parts.uri.path().to_string()),
    };

    match state.authenticator().authenticate(&ctx, &user, &password).await {
        Ok(()) => {}
        Err(RegistryAuthError::AuthenticationFailed(reason)) => {
            tracing::info!(user = %user, reason = %reason, "Authentication failed");
            return Err(ServerError::InvalidCredentials { realm });
        }
        Err(e) => return Err(e.into()),
    }

    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map_err(|e| ServerError::InvalidQuery(e.body_text()))?;

    let auth_request = if config.token.require_client_id {
        AuthorizationRequest::from_params_with_client_id(&params)?
    } else {
        AuthorizationRequest::from_params(&params)?
    };

    if auth_request.account != user {
        return Err(ServerError::AccountMismatch);
    }
    let auth_request = match ctx.remote_addr {
        Some(ip) => auth_request.with_ip(ip),
        None => auth_request,
    };

    let granted = state.authorizer().authorize(&ctx, &auth_request).await?;
    let token = state
        .generator()
        .generate_token(&auth_request, &granted, &state.token_options())?;

    tracing::info!(
        account = %auth_request.account,
        service = %auth_request.service,
        scope = %auth_request.scope(),
        granted = %granted,
        "Token issued"
    );

    Ok(Json(token))
}

/// Decode `Authorization: Basic <base64(user:password)>`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// First `X-Forwarded-For` entry when trusted, otherwise the peer address.
fn client_ip(parts: &Parts, trust_forwarded_for: bool) -> Option<IpAddr> {
    let forwarded = trust_forwarded_for
        .then(|| parts.headers.get(FORWARDED_FOR))
        .flatten()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    forwarded.or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[test]
    fn test_basic_credentials() {
        let encoded = STANDARD.encode("alice:s3cr:et");
        assert_eq!(
            basic_credentials(&headers(&format!("Basic {encoded}"))),
            Some(("alice".to_string(), "s3cr:et".to_string()))
        );
        assert_eq!(
            basic_credentials(&headers(&format!("basic {encoded}"))),
            Some(("alice".to_string(), "s3cr:et".to_string()))
        );

        assert_eq!(basic_credentials(&HeaderMap::new()), None);
        assert_eq!(basic_credentials(&headers(&format!("Bearer {encoded}"))), None);
        assert_eq!(basic_credentials(&headers("Basic !!!")), None);
        let no_colon = STANDARD.encode("alice");
        assert_eq!(basic_credentials(&headers(&format!("Basic {no_colon}"))), None);
    }

    #[test]
    fn test_client_ip() {
        let (mut parts, _) = axum::http::Request::builder()
            .header(FORWARDED_FOR, "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 40000))));

        assert_eq!(client_ip(&parts, true), Some("203.0.113.9".parse().unwrap()));
        assert_eq!(client_ip(&parts, false), Some("10.0.0.1".parse().unwrap()));

        let (bare, _) = axum::http::Request::builder().body(Body::empty()).unwrap().into_parts();
        assert_eq!(client_ip(&bare, true), None);
    }
}
