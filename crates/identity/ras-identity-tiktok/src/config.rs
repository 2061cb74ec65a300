//! TikTok Login Kit configuration.

use crate::scope::{GrantedScopes, SCOPE_BASIC};
use ras_identity_oauth2::{AuthScheme, OAuth2Error, OAuth2ProviderConfig, OAuth2Result};
use serde::{Deserialize, Serialize};

pub const PROVIDER_ID: &str = "tiktok-loginkit";
pub const AUTHORIZATION_ENDPOINT: &str = "https://www.tiktok.com/v2/auth/authorize/";
pub const TOKEN_ENDPOINT: &str = "https://open.tiktokapis.com/v2/oauth/token/";
pub const USER_INFO_ENDPOINT: &str = "https://open.tiktokapis.com/v2/user/info/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TikTokConfig {
    pub client_key: String,
    pub client_secret: String,
    /// Scopes requested at authorization time (comma or space separated)
    pub scope: String,
    /// Skip the user info request; the identity then carries no `info` and
    /// an empty `extra`
    pub skip_info: bool,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub path_prefix: String,
}

impl TikTokConfig {
    pub fn new(client_key: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_key: client_key.into(),
            client_secret: client_secret.into(),
            scope: SCOPE_BASIC.to_string(),
            skip_info: false,
            authorization_endpoint: AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            userinfo_endpoint: USER_INFO_ENDPOINT.to_string(),
            path_prefix: "/auth".to_string(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_skip_info(mut self, skip_info: bool) -> Self {
        self.skip_info = skip_info;
        self
    }

    /// Point the provider at other endpoints, e.g. a local mock server.
    pub fn with_endpoints(
        mut self,
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        userinfo_endpoint: impl Into<String>,
    ) -> Self {
        self.authorization_endpoint = authorization_endpoint.into();
        self.token_endpoint = token_endpoint.into();
        self.userinfo_endpoint = userinfo_endpoint.into();
        self
    }

    pub fn with_path_prefix(mut self, path_prefix: impl Into<String>) -> Self {
        self.path_prefix = path_prefix.into();
        self
    }

    pub fn validate(&self) -> OAuth2Result<()> {
        if self.client_key.trim().is_empty() {
            return Err(OAuth2Error::ConfigError(
                "TikTok client_key is required".to_string(),
            ));
        }
        if self.client_secret.trim().is_empty() {
            return Err(OAuth2Error::ConfigError(
                "TikTok client_secret is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Generic flow configuration. TikTok expects credentials in the token
    /// request body and comma separated scopes.
    pub fn provider_config(&self) -> OAuth2ProviderConfig {
        OAuth2ProviderConfig::new(
            PROVIDER_ID,
            &self.client_key,
            &self.client_secret,
            &self.authorization_endpoint,
            &self.token_endpoint,
        )
        .with_scopes(GrantedScopes::parse(&self.scope).into_vec(), ",")
        .with_auth_scheme(AuthScheme::RequestBody)
        .with_path_prefix(&self.path_prefix)
    }
}
