//! Authorization requests extracted from token-endpoint query parameters.

use crate::action::ActionSet;
use crate::error::RegistryAuthError;
use crate::scope::{Scope, ScopeType};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::net::IpAddr;

/// Read-only key/value lookup supplied by the transport layer.
pub trait ParamSource {
    fn param(&self, key: &str) -> Option<&str>;
}

impl<S: BuildHasher> ParamSource for HashMap<String, String, S> {
    fn param(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl ParamSource for BTreeMap<String, String> {
    fn param(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Requested token lifetime mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    #[default]
    Online,
    Offline,
}

impl AccessType {
    /// `offline` maps to [`AccessType::Offline`]; anything else, including absence, is online.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("offline") => AccessType::Offline,
            _ => AccessType::Online,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Online => "online",
            AccessType::Offline => "offline",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed request for a token on one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRequest {
    pub account: String,
    pub service: String,
    pub client_id: Option<String>,
    pub access_type: AccessType,
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
    pub name: String,
    pub actions: ActionSet,
    pub ip: Option<IpAddr>,
}

impl AuthorizationRequest {
    /// Build an online request for `scope`. An empty account falls back to the scope name.
    pub fn new(account: impl Into<String>, service: impl Into<String>, scope: Scope) -> Self {
        let mut account = account.into();
        if account.is_empty() {
            account = scope.name.clone();
        }

        Self {
            account,
            service: service.into(),
            client_id: None,
            access_type: AccessType::Online,
            scope_type: scope.scope_type,
            name: scope.name,
            actions: scope.actions,
            ip: None,
        }
    }

    /// Extract a request requiring `account`, `service` and `scope`.
    ///
    /// `client_id` is recorded when present.
    pub fn from_params<P: ParamSource + ?Sized>(params: &P) -> Result<Self, RegistryAuthError> {
        Self::extract(params, false)
    }

    /// Extract a request that additionally requires `client_id`.
    pub fn from_params_with_client_id<P: ParamSource + ?Sized>(
        params: &P,
    ) -> Result<Self, RegistryAuthError> {
        Self::extract(params, true)
    }

    fn extract<P: ParamSource + ?Sized>(
        params: &P,
        require_client_id: bool,
    ) -> Result<Self, RegistryAuthError> {
        let account = required(params, "account")?;
        let service = required(params, "service")?;

        let client_id = match non_empty(params, "client_id") {
            Some(id) => Some(id.to_string()),
            None if require_client_id => {
                return Err(RegistryAuthError::MissingParameter("client_id"));
            }
            None => None,
        };

        let access_type = AccessType::parse(params.param("access_type"));
        if access_type == AccessType::Offline {
            return Err(RegistryAuthError::UnsupportedAccessType(
                access_type.to_string(),
            ));
        }

        let scope: Scope = required(params, "scope")?.parse()?;

        let mut request = Self::new(account, service, scope);
        request.client_id = client_id;
        request.access_type = access_type;
        Ok(request)
    }

    /// Attach the client address observed by the transport.
    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    /// The requested scope.
    pub fn scope(&self) -> Scope {
        Scope::new(self.scope_type, self.name.clone(), self.actions.clone())
    }
}

fn non_empty<'a, P: ParamSource + ?Sized>(params: &'a P, key: &str) -> Option<&'a str> {
    params.param(key).filter(|v| !v.is_empty())
}

fn required<'a, P: ParamSource + ?Sized>(
    params: &'a P,
    key: &'static str,
) -> Result<&'a str, RegistryAuthError> {
    non_empty(params, key).ok_or(RegistryAuthError::MissingParameter(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionType::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_can_parse_authorization_request() {
        let q = params(&[
            ("account", "test"),
            ("service", "test"),
            ("scope", "repository:foo/bar:pull,push"),
        ]);

        let req = AuthorizationRequest::from_params(&q).unwrap();
        assert_eq!(req.account, "test");
        assert_eq!(req.service, "test");
        assert_eq!(req.scope_type, ScopeType::Repository);
        assert_eq!(req.name, "foo/bar");
        assert_eq!(req.actions.as_slice(), &[Pull, Push]);
        assert_eq!(req.access_type, AccessType::Online);
        assert_eq!(req.client_id, None);
        assert_eq!(req.ip, None);
    }

    #[test]
    fn test_missing_parameters() {
        let full = [
            ("account", "test"),
            ("service", "registry"),
            ("scope", "repository:foo/bar:pull"),
        ];

        for (i, (key, _)) in full.iter().enumerate() {
            let mut pairs = full.to_vec();
            pairs.remove(i);
            let err = AuthorizationRequest::from_params(&params(&pairs)).unwrap_err();
            assert!(
                matches!(err, RegistryAuthError::MissingParameter(k) if k == *key),
                "removing {key} gave {err:?}"
            );
        }

        let mut pairs = full.to_vec();
        pairs[0] = ("account", "");
        assert!(matches!(
            AuthorizationRequest::from_params(&params(&pairs)),
            Err(RegistryAuthError::MissingParameter("account"))
        ));
    }

    #[test]
    fn test_client_id_variant() {
        let mut q = params(&[
            ("account", "test"),
            ("service", "registry"),
            ("scope", "repository:foo/bar:pull"),
        ]);

        assert!(matches!(
            AuthorizationRequest::from_params_with_client_id(&q),
            Err(RegistryAuthError::MissingParameter("client_id"))
        ));

        q.insert("client_id".into(), "docker".into());
        let req = AuthorizationRequest::from_params_with_client_id(&q).unwrap();
        assert_eq!(req.client_id.as_deref(), Some("docker"));

        let req = AuthorizationRequest::from_params(&q).unwrap();
        assert_eq!(req.client_id.as_deref(), Some("docker"));
    }

    #[test]
    fn test_access_type() {
        let mut q = BTreeMap::new();
        q.insert("account".to_string(), "test".to_string());
        q.insert("service".to_string(), "registry".to_string());
        q.insert("scope".to_string(), "repository:foo/bar:pull".to_string());

        q.insert("access_type".to_string(), "bogus".to_string());
        let req = AuthorizationRequest::from_params(&q).unwrap();
        assert_eq!(req.access_type, AccessType::Online);

        q.insert("access_type".to_string(), "offline".to_string());
        let err = AuthorizationRequest::from_params(&q).unwrap_err();
        assert!(matches!(err, RegistryAuthError::UnsupportedAccessType(ref t) if t == "offline"));
    }

    #[test]
    fn test_offline_checked_before_scope() {
        let q = params(&[
            ("account", "test"),
            ("service", "registry"),
            ("access_type", "offline"),
            ("scope", "garbage"),
        ]);
        assert!(matches!(
            AuthorizationRequest::from_params(&q),
            Err(RegistryAuthError::UnsupportedAccessType(_))
        ));
    }

    #[test]
    fn test_invalid_scope_propagates() {
        let q = params(&[
            ("account", "test"),
            ("service", "registry"),
            ("scope", "repository:foo/bar"),
        ]);
        assert!(matches!(
            AuthorizationRequest::from_params(&q),
            Err(RegistryAuthError::InvalidScope(_))
        ));
    }

    #[test]
    fn test_account_falls_back_to_scope_name() {
        let scope: Scope = "repository:team/app:pull".parse().unwrap();
        let req = AuthorizationRequest::new("", "registry", scope.clone());
        assert_eq!(req.account, "team/app");
        assert_eq!(req.scope(), scope);

        let req = AuthorizationRequest::new("alice", "registry", scope);
        assert_eq!(req.account, "alice");
    }

    #[test]
    fn test_with_ip() {
        let scope: Scope = "repository:a:pull".parse().unwrap();
        let ip: IpAddr = "10.0.0.7".parse().unwrap();
        let req = AuthorizationRequest::new("a", "registry", scope).with_ip(ip);
        assert_eq!(req.ip, Some(ip));
    }
}
