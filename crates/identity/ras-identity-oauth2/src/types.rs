//! OAuth2 protocol types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordered list of query or form parameters.
///
/// Order is preserved so that generated URLs and request bodies are
/// deterministic. Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    /// Rename a key, keeping its position.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(entry) = self.0.iter_mut().find(|(k, _)| k == from) {
            entry.0 = to.to_string();
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Query parameters of the provider's redirect back to the callback
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Scopes the user actually granted, when the provider reports them
    pub scopes: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();
        Self {
            code: get("code"),
            state: get("state"),
            scopes: get("scopes"),
            error: get("error"),
            error_description: get("error_description"),
        }
    }
}

/// OAuth2 token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Provider specific fields, e.g. TikTok's `open_id`
    #[serde(flatten)]
    pub params: HashMap<String, serde_json::Value>,
}
