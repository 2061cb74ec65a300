//! OAuth2 configuration types.

use crate::error::{OAuth2Error, OAuth2Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How client credentials are presented to the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `client_id` and `client_secret` sent as form fields in the request body
    #[default]
    RequestBody,
    /// HTTP Basic authentication header
    BasicAuth,
}

/// OAuth2 provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2ProviderConfig {
    pub provider_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub scopes: Vec<String>,
    /// Separator used when joining `scopes` into the `scope` parameter
    pub scope_separator: String,
    pub auth_scheme: AuthScheme,
    /// Mount point of the provider routes, e.g. `/auth`
    pub path_prefix: String,
    /// Additional parameters to include in authorization request
    pub auth_params: BTreeMap<String, String>,
}

impl OAuth2ProviderConfig {
    pub fn new(
        provider_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            scopes: Vec::new(),
            scope_separator: " ".to_string(),
            auth_scheme: AuthScheme::default(),
            path_prefix: "/auth".to_string(),
            auth_params: BTreeMap::new(),
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>, separator: impl Into<String>) -> Self {
        self.scopes = scopes;
        self.scope_separator = separator.into();
        self
    }

    pub fn with_auth_scheme(mut self, auth_scheme: AuthScheme) -> Self {
        self.auth_scheme = auth_scheme;
        self
    }

    pub fn with_path_prefix(mut self, path_prefix: impl Into<String>) -> Self {
        self.path_prefix = path_prefix.into();
        self
    }

    pub fn with_auth_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth_params.insert(key.into(), value.into());
        self
    }

    /// Path that starts the flow, e.g. `/auth/tiktok-loginkit`
    pub fn request_path(&self) -> String {
        format!(
            "{}/{}",
            self.path_prefix.trim_end_matches('/'),
            self.provider_id
        )
    }

    pub fn callback_path(&self) -> String {
        format!("{}/callback", self.request_path())
    }

    /// Full callback URL registered with the provider
    pub fn redirect_uri(&self, host_url: &str) -> String {
        format!("{}{}", host_url.trim_end_matches('/'), self.callback_path())
    }

    pub fn scope(&self) -> String {
        self.scopes.join(&self.scope_separator)
    }

    /// Fails fast on missing client credentials.
    pub fn validate(&self) -> OAuth2Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(OAuth2Error::ConfigError(format!(
                "client_id is required for provider '{}'",
                self.provider_id
            )));
        }
        if self.client_secret.trim().is_empty() {
            return Err(OAuth2Error::ConfigError(format!(
                "client_secret is required for provider '{}'",
                self.provider_id
            )));
        }
        Ok(())
    }
}

/// OAuth2 client configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    pub state_ttl_seconds: u64,
    pub http_timeout_seconds: u64,
}

impl Default for OAuth2Config {
    fn default() -> Self {
        Self {
            state_ttl_seconds: 600, // 10 minutes
            http_timeout_seconds: 30,
        }
    }
}

impl OAuth2Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state_ttl(mut self, seconds: u64) -> Self {
        self.state_ttl_seconds = seconds;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuth2ProviderConfig {
        OAuth2ProviderConfig::new(
            "example",
            "client",
            "secret",
            "https://example.com/authorize",
            "https://example.com/token",
        )
    }

    #[test]
    fn test_callback_paths() {
        let config = config();
        assert_eq!(config.request_path(), "/auth/example");
        assert_eq!(config.callback_path(), "/auth/example/callback");
        assert_eq!(
            config.redirect_uri("http://localhost:3000/"),
            "http://localhost:3000/auth/example/callback"
        );

        let config = config.with_path_prefix("/login/");
        assert_eq!(config.callback_path(), "/login/example/callback");
    }

    #[test]
    fn test_scope_joined_with_separator() {
        let config = config().with_scopes(
            vec!["user.info.basic".to_string(), "user.info.profile".to_string()],
            ",",
        );
        assert_eq!(config.scope(), "user.info.basic,user.info.profile");
    }

    #[test]
    fn test_validate_requires_credentials() {
        assert!(config().validate().is_ok());

        let mut missing_id = config();
        missing_id.client_id = String::new();
        assert!(matches!(
            missing_id.validate(),
            Err(OAuth2Error::ConfigError(msg)) if msg.contains("client_id")
        ));

        let mut missing_secret = config();
        missing_secret.client_secret = "  ".to_string();
        assert!(matches!(
            missing_secret.validate(),
            Err(OAuth2Error::ConfigError(msg)) if msg.contains("client_secret")
        ));
    }
}
