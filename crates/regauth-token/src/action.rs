//! Action vocabulary.

use crate::error::RegistryAuthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A permission a token can grant on a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    #[serde(rename = "pull")]
    Pull,
    #[serde(rename = "push")]
    Push,
    #[serde(rename = "catalog")]
    Catalog,
    #[serde(rename = "admin")]
    Admin,
    /// Wildcard, serialized as `*`.
    #[serde(rename = "*")]
    All,
}

impl ActionType {
    /// The literal text of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Pull => "pull",
            ActionType::Push => "push",
            ActionType::Catalog => "catalog",
            ActionType::Admin => "admin",
            ActionType::All => "*",
        }
    }
}

impl FromStr for ActionType {
    type Err = RegistryAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pull" => Ok(ActionType::Pull),
            "push" => Ok(ActionType::Push),
            "catalog" => Ok(ActionType::Catalog),
            "admin" => Ok(ActionType::Admin),
            "*" => Ok(ActionType::All),
            other => Err(RegistryAuthError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered actions, in the order they were requested or granted.
///
/// Duplicates are kept. Equality compares membership only, so
/// `[pull, push]`, `[push, pull]` and `[pull, pull, push]` are all equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(Vec<ActionType>);

impl ActionSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse every action string, failing on the first unknown one.
    pub fn parse<I, S>(actions: I) -> Result<Self, RegistryAuthError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        actions
            .into_iter()
            .map(|a| a.as_ref().parse::<ActionType>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn contains(&self, action: ActionType) -> bool {
        self.0.iter().any(|a| *a == action)
    }

    /// True when every requested action is in this set. An empty request is always satisfied.
    pub fn contains_all<'a, I>(&self, requested: I) -> bool
    where
        I: IntoIterator<Item = &'a ActionType>,
    {
        requested.into_iter().all(|a| self.contains(*a))
    }

    /// The literal text of each action, in order.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|a| a.as_str().to_string()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionType> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[ActionType] {
        &self.0
    }
}

impl PartialEq for ActionSet {
    fn eq(&self, other: &Self) -> bool {
        self.contains_all(other) && other.contains_all(self)
    }
}

impl Eq for ActionSet {}

impl From<Vec<ActionType>> for ActionSet {
    fn from(actions: Vec<ActionType>) -> Self {
        Self(actions)
    }
}

impl<const N: usize> From<[ActionType; N]> for ActionSet {
    fn from(actions: [ActionType; N]) -> Self {
        Self(actions.to_vec())
    }
}

impl FromIterator<ActionType> for ActionSet {
    fn from_iter<T: IntoIterator<Item = ActionType>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ActionSet {
    type Item = &'a ActionType;
    type IntoIter = std::slice::Iter<'a, ActionType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ActionSet {
    type Item = ActionType;
    type IntoIter = std::vec::IntoIter<ActionType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_strings().join(","))
    }
}
