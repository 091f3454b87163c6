//! Scope grammar: `<type>:<name>:<action>[,<action>...]`.
//!
//! The grammar has exactly two `:` separators, so a resource name that itself
//! contains `:` cannot be expressed and is rejected as an invalid scope.

use crate::action::{ActionSet, ActionType};
use crate::error::RegistryAuthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name used for registry-wide scopes that do not name a resource.
pub const CATALOG_NAME: &str = "catalog";

/// The kind of resource a scope refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    Repository,
    Registry,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Repository => "repository",
            ScopeType::Registry => "registry",
        }
    }
}

impl FromStr for ScopeType {
    type Err = RegistryAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repository" => Ok(ScopeType::Repository),
            "registry" => Ok(ScopeType::Registry),
            other => Err(RegistryAuthError::InvalidScopeType(other.to_string())),
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an empty or `.` name to [`CATALOG_NAME`]; any other name is returned unchanged.
///
/// Not applied by [`Scope::from_str`]; callers building registry-wide scopes opt in.
pub fn normalize_name(name: &str) -> &str {
    if name.is_empty() || name == "." {
        CATALOG_NAME
    } else {
        name
    }
}

/// A resource and the actions requested on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
    pub name: String,
    pub actions: ActionSet,
}

impl Scope {
    pub fn new(scope_type: ScopeType, name: impl Into<String>, actions: impl Into<ActionSet>) -> Self {
        Self {
            scope_type,
            name: name.into(),
            actions: actions.into(),
        }
    }

    /// A registry-wide scope; an empty or `.` name becomes `catalog`.
    pub fn registry(name: &str, actions: impl Into<ActionSet>) -> Self {
        Self::new(ScopeType::Registry, normalize_name(name), actions)
    }

    pub fn allows(&self, action: ActionType) -> bool {
        self.actions.contains(action)
    }
}

impl FromStr for Scope {
    type Err = RegistryAuthError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split(':').collect();
        let [scope_type, name, actions] = parts.as_slice() else {
            return Err(RegistryAuthError::InvalidScope(raw.to_string()));
        };

        let scope_type = scope_type.parse::<ScopeType>()?;
        let actions = ActionSet::parse(actions.split(','))?;

        Ok(Self {
            scope_type,
            name: name.to_string(),
            actions,
        })
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.scope_type, self.name, self.actions)
    }
}
