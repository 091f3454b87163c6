//! Token issuance and inspection.

use crate::action::ActionSet;
use crate::claims::{ClaimSet, Header, ResourceActions, TOKEN_TYPE};
use crate::error::RegistryAuthError;
use crate::keys::KeyPair;
use crate::request::AuthorizationRequest;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Separator between the three segments of a compact token.
pub const TOKEN_SEPARATOR: char = '.';

/// Seconds subtracted from `iat` for `nbf`, to tolerate clock skew between hosts.
pub const NOT_BEFORE_LEEWAY_SECS: i64 = 10;

/// Options controlling a single issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenOptions {
    /// Lifetime in seconds.
    pub expires_in: i64,
    pub issuer: String,
    /// Must equal the request's service.
    pub audience: String,
}

/// Token endpoint response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
    /// Same value as `token`; some clients only read this field.
    pub access_token: String,
    pub issued_at: i64,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Issues signed tokens for authorized requests.
pub trait TokenGenerator: Send + Sync {
    /// Issue a token granting `granted` on the request's scope.
    ///
    /// Fails unless `granted` covers every requested action and the
    /// request's service matches `options.audience`.
    fn generate_token(
        &self,
        request: &AuthorizationRequest,
        granted: &ActionSet,
        options: &TokenOptions,
    ) -> Result<Token, RegistryAuthError>;
}

/// [`TokenGenerator`] signing with a process-wide key pair.
#[derive(Debug, Clone, Default)]
pub struct DefaultTokenGenerator {
    keypair: Option<Arc<KeyPair>>,
}

impl DefaultTokenGenerator {
    pub fn new(keypair: Arc<KeyPair>) -> Self {
        Self {
            keypair: Some(keypair),
        }
    }

    /// Load the key pair from a certificate and private key file.
    pub fn load(certificate_path: &Path, private_key_path: &Path) -> Result<Self, RegistryAuthError> {
        let keypair = KeyPair::load(certificate_path, private_key_path)?;
        Ok(Self::new(Arc::new(keypair)))
    }

    pub fn keypair(&self) -> Option<&Arc<KeyPair>> {
        self.keypair.as_ref()
    }

    fn issue(
        &self,
        request: &AuthorizationRequest,
        granted: &ActionSet,
        options: &TokenOptions,
        now: i64,
    ) -> Result<Token, RegistryAuthError> {
        let keypair = self.keypair.as_deref().ok_or_else(|| {
            RegistryAuthError::Configuration("signing key pair is not loaded".to_string())
        })?;

        if options.expires_in < 0 {
            return Err(RegistryAuthError::InvalidArgument(format!(
                "expires_in must not be negative, got {}",
                options.expires_in
            )));
        }
        if options.issuer.is_empty() {
            return Err(RegistryAuthError::InvalidArgument(
                "issuer must not be empty".to_string(),
            ));
        }

        if request.service != options.audience {
            return Err(RegistryAuthError::AudienceMismatch {
                service: request.service.clone(),
                audience: options.audience.clone(),
            });
        }

        // Re-check the grant even though the authorizer produced it.
        if !granted.contains_all(&request.actions) {
            return Err(RegistryAuthError::PermissionDenied {
                requested: request.actions.clone(),
                granted: granted.clone(),
            });
        }

        let expires_at = now.checked_add(options.expires_in).ok_or_else(|| {
            RegistryAuthError::InvalidArgument(format!(
                "expires_in {} overflows the expiry timestamp",
                options.expires_in
            ))
        })?;

        let algorithm = keypair.algorithm();
        let header = Header {
            token_type: TOKEN_TYPE.to_string(),
            signing_alg: algorithm,
            key_id: keypair.key_id().to_string(),
        };

        let claims = ClaimSet {
            iss: options.issuer.clone(),
            sub: request.account.clone(),
            aud: options.audience.clone(),
            exp: expires_at,
            nbf: now - NOT_BEFORE_LEEWAY_SECS,
            iat: now,
            jti: random_token_id(),
            access: vec![ResourceActions {
                resource_type: request.scope_type.to_string(),
                name: request.name.clone(),
                actions: granted.to_strings(),
            }],
        };

        let signing_input = format!(
            "{}{TOKEN_SEPARATOR}{}",
            encode_json_segment(&header)?,
            encode_json_segment(&claims)?
        );

        let (signature, signed_with) = keypair.sign(signing_input.as_bytes())?;
        if signed_with != algorithm {
            return Err(RegistryAuthError::Signing(format!(
                "key signed with {signed_with} but header declares {algorithm}"
            )));
        }

        let compact = format!(
            "{signing_input}{TOKEN_SEPARATOR}{}",
            URL_SAFE_NO_PAD.encode(signature)
        );

        tracing::debug!(
            subject = %claims.sub,
            audience = %claims.aud,
            scope_type = %request.scope_type,
            name = %request.name,
            actions = %granted,
            jti = %claims.jti,
            "Issued registry token"
        );

        Ok(Token {
            token: compact.clone(),
            access_token: compact,
            issued_at: now,
            expires_in: options.expires_in,
            refresh_token: None,
        })
    }
}

impl TokenGenerator for DefaultTokenGenerator {
    fn generate_token(
        &self,
        request: &AuthorizationRequest,
        granted: &ActionSet,
        options: &TokenOptions,
    ) -> Result<Token, RegistryAuthError> {
        self.issue(request, granted, options, Utc::now().timestamp())
    }
}

/// Decimal string of a random non-negative `i64`. Uniqueness is probabilistic only.
fn random_token_id() -> String {
    rand::thread_rng().gen_range(0..=i64::MAX).to_string()
}

fn encode_json_segment<T: Serialize>(value: &T) -> Result<String, RegistryAuthError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| RegistryAuthError::Signing(format!("failed to encode token segment: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decoded contents of a compact token (for inspection and tests).
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub header: Header,
    pub claims: ClaimSet,
    /// `header.claims` exactly as signed.
    pub signing_input: String,
    pub signature: Vec<u8>,
}

/// Decode a compact token without verifying its signature.
pub fn inspect_token_unverified(token: &str) -> Result<TokenInfo, RegistryAuthError> {
    let segments: Vec<&str> = token.trim().split(TOKEN_SEPARATOR).collect();
    let &[header, claims, signature] = segments.as_slice() else {
        return Err(RegistryAuthError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let decode = |segment: &str, what: &str| {
        URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| RegistryAuthError::MalformedToken(format!("{what}: {e}")))
    };

    let header_json = decode(header, "header")?;
    let claims_json = decode(claims, "claims")?;
    let signature = decode(signature, "signature")?;

    Ok(TokenInfo {
        header: serde_json::from_slice(&header_json)
            .map_err(|e| RegistryAuthError::MalformedToken(format!("header: {e}")))?,
        claims: serde_json::from_slice(&claims_json)
            .map_err(|e| RegistryAuthError::MalformedToken(format!("claims: {e}")))?,
        signing_input: format!("{header}{TOKEN_SEPARATOR}{claims}"),
        signature,
    })
}
