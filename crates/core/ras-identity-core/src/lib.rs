//! Core identity provider traits and types.
//!
//! Providers hand the host application a [`NormalizedIdentity`]: a provider
//! agnostic record with a stable `uid`, display info, credentials and the raw
//! provider profile. Failures are reported through [`IdentityError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid or missing state parameter")]
    StateMismatch,

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    #[error("Provider returned an error: {0}")]
    Callback(String),

    #[error("Token exchange failed ({status:?}): {body}")]
    TokenExchangeFailed { status: Option<u16>, body: String },

    #[error("Profile fetch failed ({status:?}): {body}")]
    ProfileFetchFailed { status: Option<u16>, body: String },

    #[error("Malformed profile response: {0}")]
    MalformedProfileResponse(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Display information about the authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityInfo {
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Labelled profile links, e.g. `"TikTok" => "https://..."`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<BTreeMap<String, String>>,
}

impl IdentityInfo {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            nickname: None,
            description: None,
            urls: None,
        }
    }
}

/// Credentials obtained during the token exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityCredentials {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires: bool,
    /// Unix timestamp (seconds) at which `token` stops being valid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Provider agnostic identity handed to the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedIdentity {
    pub provider: String,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<IdentityInfo>,
    pub credentials: IdentityCredentials,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Input of the request phase.
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    /// Key binding the anti-forgery state to the caller's session
    pub session_id: String,
    /// Scheme and authority the provider should redirect back to,
    /// e.g. `http://localhost:3000`
    pub host_url: String,
}

/// Redirect produced by the request phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRedirect {
    pub location: String,
    pub state: String,
}

/// Input of the callback phase.
#[derive(Debug, Clone)]
pub struct CallbackRequest {
    pub session_id: String,
    /// Query parameters of the provider's redirect (`code`, `state`, `scopes`, ...)
    pub params: HashMap<String, String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Build the redirect to the provider's authorization endpoint.
    async fn authorize(&self, request: AuthorizeRequest) -> IdentityResult<AuthorizationRedirect>;

    /// Complete the flow from the provider's redirect back to us.
    async fn callback(&self, request: CallbackRequest) -> IdentityResult<NormalizedIdentity>;
}
