//! Generic authorization code flow parameterized by a provider strategy.

use crate::client::{AccessToken, OAuth2Client};
use crate::config::{OAuth2Config, OAuth2ProviderConfig};
use crate::error::{OAuth2Error, OAuth2Result};
use crate::state::OAuth2StateStore;
use crate::types::{CallbackParams, QueryParams};
use async_trait::async_trait;
use ras_identity_core::{
    AuthorizationRedirect, AuthorizeRequest, CallbackRequest, IdentityProvider, IdentityResult,
    NormalizedIdentity,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a strategy needs to build an identity once the code has been
/// exchanged.
pub struct CallbackContext<'a> {
    pub access_token: &'a AccessToken,
    pub params: &'a CallbackParams,
}

/// Provider specific parts of the authorization code flow.
#[async_trait]
pub trait ProviderStrategy: Send + Sync {
    fn provider_config(&self) -> &OAuth2ProviderConfig;

    /// Adjust the authorization request query before the redirect is built.
    fn augment_authorize_params(&self, _params: &mut QueryParams) {}

    /// Adjust the token exchange form body before it is sent.
    fn augment_token_params(&self, _params: &mut QueryParams) {}

    /// Map the exchanged token (and whatever the strategy fetches with it)
    /// into a normalized identity.
    async fn build_identity(
        &self,
        context: CallbackContext<'_>,
    ) -> OAuth2Result<NormalizedIdentity>;
}

/// Authorization code flow for a single provider
pub struct OAuth2Flow<S> {
    client: OAuth2Client,
    strategy: S,
}

impl<S: ProviderStrategy> OAuth2Flow<S> {
    pub fn new(
        config: OAuth2Config,
        state_store: Arc<dyn OAuth2StateStore>,
        strategy: S,
    ) -> OAuth2Result<Self> {
        strategy.provider_config().validate()?;
        let client = OAuth2Client::new(&config, state_store)?;
        Ok(Self { client, strategy })
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn client(&self) -> &OAuth2Client {
        &self.client
    }

    /// Build the authorization redirect and remember its state for the session.
    pub async fn request_phase(
        &self,
        session_id: &str,
        host_url: &str,
    ) -> OAuth2Result<AuthorizationRedirect> {
        let provider_config = self.strategy.provider_config();
        let (location, state) = self
            .client
            .generate_authorization_url(provider_config, session_id, host_url, |params| {
                self.strategy.augment_authorize_params(params)
            })
            .await?;

        info!(
            "Started OAuth2 flow for provider: {}",
            provider_config.provider_id
        );

        Ok(AuthorizationRedirect { location, state })
    }

    /// Validate the provider's redirect, exchange the code and build the identity.
    pub async fn callback_phase(
        &self,
        session_id: &str,
        params: CallbackParams,
    ) -> OAuth2Result<NormalizedIdentity> {
        let provider_config = self.strategy.provider_config();

        let state = self
            .client
            .verify_state(provider_config, session_id, params.state.as_deref())
            .await
            .inspect_err(|e| {
                warn!(
                    "Rejected callback for provider {}: {}",
                    provider_config.provider_id, e
                )
            })?;

        if let Some(error) = &params.error {
            let error_desc = params
                .error_description
                .as_deref()
                .unwrap_or("No description");
            return Err(OAuth2Error::CallbackError(format!(
                "{}: {}",
                error, error_desc
            )));
        }

        let code = params
            .code
            .as_deref()
            .ok_or(OAuth2Error::MissingAuthorizationCode)?;

        let access_token = self
            .client
            .exchange_code(provider_config, code, &state.redirect_uri, |form| {
                self.strategy.augment_token_params(form)
            })
            .await?;

        let identity = self
            .strategy
            .build_identity(CallbackContext {
                access_token: &access_token,
                params: &params,
            })
            .await?;

        info!(
            "Successfully verified identity for provider: {}",
            provider_config.provider_id
        );

        Ok(identity)
    }
}

#[async_trait]
impl<S: ProviderStrategy> IdentityProvider for OAuth2Flow<S> {
    fn provider_id(&self) -> &str {
        &self.strategy.provider_config().provider_id
    }

    async fn authorize(&self, request: AuthorizeRequest) -> IdentityResult<AuthorizationRedirect> {
        Ok(self
            .request_phase(&request.session_id, &request.host_url)
            .await?)
    }

    async fn callback(&self, request: CallbackRequest) -> IdentityResult<NormalizedIdentity> {
        let params = CallbackParams::from_query(&request.params);
        Ok(self.callback_phase(&request.session_id, params).await?)
    }
}
