//! OAuth2 client implementation for the authorization code flow.

use crate::config::{AuthScheme, OAuth2Config, OAuth2ProviderConfig};
use crate::error::{OAuth2Error, OAuth2Result};
use crate::state::{OAuth2State, OAuth2StateStore, session_key};
use crate::types::{QueryParams, TokenResponse};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// Access token obtained from a code exchange.
///
/// Carries the HTTP client it was obtained with so provider adapters can
/// issue bearer-authenticated requests.
#[derive(Debug, Clone)]
pub struct AccessToken {
    response: TokenResponse,
    obtained_at: DateTime<Utc>,
    http_client: Client,
}

impl AccessToken {
    pub fn new(response: TokenResponse, http_client: Client) -> Self {
        Self {
            response,
            obtained_at: Utc::now(),
            http_client,
        }
    }

    pub fn token(&self) -> &str {
        &self.response.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.response.refresh_token.as_deref()
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.response.expires_in
    }

    pub fn expires(&self) -> bool {
        self.response.expires_in.is_some()
    }

    /// Unix timestamp at which the token expires, `None` when the provider
    /// sent no lifetime or one that does not fit a timestamp
    pub fn expires_at(&self) -> Option<i64> {
        self.response
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| self.obtained_at.timestamp().checked_add(secs))
    }

    pub fn scope(&self) -> Option<&str> {
        self.response.scope.as_deref()
    }

    pub fn response(&self) -> &TokenResponse {
        &self.response
    }

    /// Provider specific token response field
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.response.params.get(key)
    }

    /// Bearer-authenticated GET returning the parsed JSON body.
    pub async fn get_json(
        &self,
        url: &str,
        query: &QueryParams,
    ) -> OAuth2Result<serde_json::Value> {
        let mut url = Url::parse(url)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.iter() {
                pairs.append_pair(key, value);
            }
        }

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.response.access_token)
            .send()
            .await
            .map_err(|e| OAuth2Error::UserInfoFailed {
                status: e.status().map(|s| s.as_u16()),
                body: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("User info request failed with {}: {}", status, error_text);
            return Err(OAuth2Error::UserInfoFailed {
                status: Some(status.as_u16()),
                body: error_text,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidUserInfoResponse(e.to_string()))
    }
}

/// OAuth2 client for handling authorization flows
#[derive(Clone)]
pub struct OAuth2Client {
    http_client: Client,
    state_store: Arc<dyn OAuth2StateStore>,
    state_ttl_seconds: u64,
}

impl OAuth2Client {
    pub fn new(config: &OAuth2Config, state_store: Arc<dyn OAuth2StateStore>) -> OAuth2Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            state_store,
            state_ttl_seconds: config.state_ttl_seconds,
        })
    }

    pub fn state_store(&self) -> &Arc<dyn OAuth2StateStore> {
        &self.state_store
    }

    /// Generate authorization URL for a provider and remember its state for
    /// the session.
    ///
    /// `augment` may rewrite the parameters before the URL is built.
    pub async fn generate_authorization_url(
        &self,
        provider_config: &OAuth2ProviderConfig,
        session_id: &str,
        host_url: &str,
        augment: impl FnOnce(&mut QueryParams),
    ) -> OAuth2Result<(String, String)> {
        let mut url = Url::parse(&provider_config.authorization_endpoint)?;
        let redirect_uri = provider_config.redirect_uri(host_url);

        let state = OAuth2State::new(
            provider_config.provider_id.clone(),
            redirect_uri.clone(),
            self.state_ttl_seconds,
        );
        let state_param = state.state.clone();

        let mut params = QueryParams::new();
        params.insert("client_id", &provider_config.client_id);
        params.insert("redirect_uri", redirect_uri);
        params.insert("response_type", "code");
        if !provider_config.scopes.is_empty() {
            params.insert("scope", provider_config.scope());
        }
        params.insert("state", &state_param);

        // Add provider-specific parameters
        for (key, value) in &provider_config.auth_params {
            params.insert(key, value);
        }

        augment(&mut params);

        url.query_pairs_mut().extend_pairs(params.iter());

        self.state_store
            .store(
                &session_key(session_id, &provider_config.provider_id),
                state,
            )
            .await?;

        debug!(
            "Generated authorization URL for provider {}",
            provider_config.provider_id
        );

        Ok((url.to_string(), state_param))
    }

    /// Consume the session's pending state and check it against the value
    /// echoed by the provider.
    pub async fn verify_state(
        &self,
        provider_config: &OAuth2ProviderConfig,
        session_id: &str,
        state_param: Option<&str>,
    ) -> OAuth2Result<OAuth2State> {
        let stored = self
            .state_store
            .take(&session_key(session_id, &provider_config.provider_id))
            .await?;

        let Some(state_param) = state_param else {
            return Err(OAuth2Error::InvalidState);
        };

        if stored.state != state_param || stored.provider_id != provider_config.provider_id {
            return Err(OAuth2Error::InvalidState);
        }

        Ok(stored)
    }

    /// Exchange authorization code for tokens
    pub async fn exchange_code(
        &self,
        provider_config: &OAuth2ProviderConfig,
        code: &str,
        redirect_uri: &str,
        augment: impl FnOnce(&mut QueryParams),
    ) -> OAuth2Result<AccessToken> {
        let mut params = QueryParams::new();
        params.insert("client_id", &provider_config.client_id);
        if provider_config.auth_scheme == AuthScheme::RequestBody {
            params.insert("client_secret", &provider_config.client_secret);
        }
        params.insert("code", code);
        params.insert("grant_type", "authorization_code");
        params.insert("redirect_uri", redirect_uri);

        augment(&mut params);

        let mut request = self
            .http_client
            .post(&provider_config.token_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params);

        if provider_config.auth_scheme == AuthScheme::BasicAuth {
            request = request.basic_auth(
                &provider_config.client_id,
                Some(&provider_config.client_secret),
            );
        }

        let response = request
            .send()
            .await
            .map_err(|e| OAuth2Error::TokenExchangeFailed {
                status: e.status().map(|s| s.as_u16()),
                body: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!("Token exchange failed with {}: {}", status, body);
            return Err(OAuth2Error::TokenExchangeFailed {
                status: Some(status.as_u16()),
                body,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| OAuth2Error::InvalidTokenResponse(e.to_string()))?;

        if value
            .get("error")
            .and_then(|e| e.as_str())
            .is_some_and(|e| !e.is_empty())
        {
            error!("Token exchange returned an error body: {}", body);
            return Err(OAuth2Error::TokenExchangeFailed {
                status: Some(status.as_u16()),
                body,
            });
        }

        let token_response: TokenResponse = serde_json::from_value(value)
            .map_err(|e| OAuth2Error::InvalidTokenResponse(e.to_string()))?;

        info!(
            "Successfully exchanged code for tokens with provider {}",
            provider_config.provider_id
        );
        Ok(AccessToken::new(token_response, self.http_client.clone()))
    }
}
