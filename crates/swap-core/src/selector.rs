//! Exact-match label selectors.
//!
//! A selector is a conjunction of `key=value` constraints. The encoded
//! form (`app=orders,version=blue`) is what list calls send to the
//! orchestrator; keys are always emitted in sorted order so the same
//! selector always encodes to the same string.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing an encoded selector.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("selector term `{0}` is not of the form key=value")]
    MalformedTerm(String),

    #[error("selector term has an empty key")]
    EmptyKey,
}

/// Conjunction of exact `key=value` label matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSelector(BTreeMap<String, String>);

impl LabelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or override) the required value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Whether every constraint is satisfied by `labels`.
    ///
    /// An empty selector matches everything.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
    }

    /// Canonical `k1=v1,k2=v2` encoding.
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse the encoding produced by [`LabelSelector::encode`].
    pub fn parse(s: &str) -> Result<Self, SelectorError> {
        let mut selector = Self::new();
        for term in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, value) = term
                .split_once('=')
                .ok_or_else(|| SelectorError::MalformedTerm(term.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(SelectorError::EmptyKey);
            }
            selector.insert(key, value.trim());
        }
        Ok(selector)
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for LabelSelector {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSelector {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
