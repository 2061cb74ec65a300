//! OAuth2 state management for CSRF protection.

use crate::error::{OAuth2Error, OAuth2Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// OAuth2 state information stored during authorization flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2State {
    pub state: String,
    pub provider_id: String,
    pub redirect_uri: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OAuth2State {
    pub fn new(provider_id: String, redirect_uri: String, ttl_seconds: u64) -> Self {
        let state = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::seconds(ttl_seconds as i64);

        Self {
            state,
            provider_id,
            redirect_uri,
            created_at,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Key under which a session's pending state is kept
pub fn session_key(session_id: &str, provider_id: &str) -> String {
    format!("{}:{}", session_id, provider_id)
}

/// Trait for OAuth2 state storage
#[async_trait]
pub trait OAuth2StateStore: Send + Sync {
    /// Store the pending state for a session, replacing any previous one
    async fn store(&self, key: &str, state: OAuth2State) -> OAuth2Result<()>;

    /// Retrieve and remove the pending state for a session
    async fn take(&self, key: &str) -> OAuth2Result<OAuth2State>;

    /// Clean up expired states
    async fn cleanup_expired(&self) -> OAuth2Result<usize>;
}

/// In-memory implementation of OAuth2StateStore
pub struct InMemoryStateStore {
    states: Arc<RwLock<HashMap<String, OAuth2State>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OAuth2StateStore for InMemoryStateStore {
    async fn store(&self, key: &str, state: OAuth2State) -> OAuth2Result<()> {
        let mut states = self.states.write().await;
        states.insert(key.to_string(), state);
        Ok(())
    }

    async fn take(&self, key: &str) -> OAuth2Result<OAuth2State> {
        let mut states = self.states.write().await;

        // Single use: removed whether or not it is still valid
        let oauth_state = states.remove(key).ok_or(OAuth2Error::StateNotFound)?;

        if oauth_state.is_expired() {
            return Err(OAuth2Error::StateNotFound);
        }

        Ok(oauth_state)
    }

    async fn cleanup_expired(&self) -> OAuth2Result<usize> {
        let mut states = self.states.write().await;
        let now = Utc::now();

        let expired_keys: Vec<String> = states
            .iter()
            .filter(|(_, state)| now > state.expires_at)
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            states.remove(&key);
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_state_store() {
        let store = InMemoryStateStore::new();
        let key = session_key("session-1", "tiktok-loginkit");

        let state = OAuth2State::new(
            "tiktok-loginkit".to_string(),
            "http://localhost:3000/auth/tiktok-loginkit/callback".to_string(),
            300,
        );
        let state_param = state.state.clone();

        store.store(&key, state).await.unwrap();

        let taken = store.take(&key).await.unwrap();
        assert_eq!(taken.state, state_param);
        assert_eq!(taken.provider_id, "tiktok-loginkit");

        // Single use
        let result = store.take(&key).await;
        assert!(matches!(result, Err(OAuth2Error::StateNotFound)));
    }

    #[tokio::test]
    async fn test_store_replaces_pending_state() {
        let store = InMemoryStateStore::new();
        let key = session_key("session-1", "tiktok-loginkit");

        let first = OAuth2State::new("tiktok-loginkit".into(), "cb".into(), 300);
        let second = OAuth2State::new("tiktok-loginkit".into(), "cb".into(), 300);
        let second_param = second.state.clone();

        store.store(&key, first).await.unwrap();
        store.store(&key, second).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.take(&key).await.unwrap().state, second_param);
    }

    #[tokio::test]
    async fn test_expired_state_is_rejected() {
        let store = InMemoryStateStore::new();
        let key = session_key("session-1", "tiktok-loginkit");

        let mut state = OAuth2State::new("tiktok-loginkit".into(), "cb".into(), 300);
        state.expires_at = Utc::now() - Duration::minutes(1);
        store.store(&key, state).await.unwrap();

        let result = store.take(&key).await;
        assert!(matches!(result, Err(OAuth2Error::StateNotFound)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_state_cleanup() {
        let store = InMemoryStateStore::new();

        let mut expired = OAuth2State::new("tiktok-loginkit".into(), "cb".into(), 300);
        expired.expires_at = Utc::now() - Duration::minutes(1);
        let fresh = OAuth2State::new("tiktok-loginkit".into(), "cb".into(), 300);

        store.store("a:tiktok-loginkit", expired).await.unwrap();
        store.store("b:tiktok-loginkit", fresh).await.unwrap();

        let cleaned = store.cleanup_expired().await.unwrap();
        assert_eq!(cleaned, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.take("b:tiktok-loginkit").await.is_ok());
    }

    #[test]
    fn test_states_are_unique_uuids() {
        let a = OAuth2State::new("p".into(), "cb".into(), 60);
        let b = OAuth2State::new("p".into(), "cb".into(), 60);
        assert_ne!(a.state, b.state);
        assert_eq!(a.state.len(), 36);
    }
}
