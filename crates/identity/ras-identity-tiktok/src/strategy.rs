//! TikTok Login Kit provider strategy.

use crate::config::{PROVIDER_ID, TikTokConfig};
use crate::profile::UserInfoLoader;
use crate::scope::{GrantedScopes, UserInfoFields};
use async_trait::async_trait;
use ras_identity_core::{IdentityCredentials, IdentityInfo, NormalizedIdentity};
use ras_identity_oauth2::{
    AccessToken, CallbackContext, CallbackParams, InMemoryStateStore, OAuth2Config, OAuth2Error,
    OAuth2Flow, OAuth2ProviderConfig, OAuth2Result, OAuth2StateStore, ProviderStrategy,
    QueryParams,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const WEB_LINK_LABEL: &str = "TikTok";
pub const DEEP_LINK_LABEL: &str = "TikTok Deep Link";

pub struct TikTokStrategy {
    config: TikTokConfig,
    provider_config: OAuth2ProviderConfig,
}

impl TikTokStrategy {
    /// Fails with a configuration error when the client key or secret is missing.
    pub fn new(config: TikTokConfig) -> OAuth2Result<Self> {
        config.validate()?;
        let provider_config = config.provider_config();
        Ok(Self {
            config,
            provider_config,
        })
    }

    pub fn config(&self) -> &TikTokConfig {
        &self.config
    }

    /// Scopes reported on the callback, or the configured scope when TikTok
    /// did not report any.
    pub fn granted_scopes(&self, params: &CallbackParams) -> GrantedScopes {
        GrantedScopes::parse(params.scopes.as_deref().unwrap_or(&self.config.scope))
    }

    async fn info(
        &self,
        loader: &UserInfoLoader<'_>,
        scopes: &GrantedScopes,
    ) -> OAuth2Result<IdentityInfo> {
        let profile = loader.profile().await?;

        let mut info = IdentityInfo::new(
            profile.require_str("display_name")?,
            profile.require_str("avatar_url_100")?,
        );

        if scopes.has_profile() {
            info.nickname = Some(profile.require_str("username")?.to_string());
            info.description = Some(profile.require_str("bio_description")?.to_string());
            info.urls = Some(BTreeMap::from([
                (
                    WEB_LINK_LABEL.to_string(),
                    profile.require_str("profile_web_link")?.to_string(),
                ),
                (
                    DEEP_LINK_LABEL.to_string(),
                    profile.require_str("profile_deep_link")?.to_string(),
                ),
            ]));
        }

        Ok(info)
    }
}

fn credentials(access_token: &AccessToken) -> IdentityCredentials {
    IdentityCredentials {
        token: access_token.token().to_string(),
        refresh_token: access_token.refresh_token().map(String::from),
        expires: access_token.expires(),
        expires_at: access_token.expires_at(),
    }
}

#[async_trait]
impl ProviderStrategy for TikTokStrategy {
    fn provider_config(&self) -> &OAuth2ProviderConfig {
        &self.provider_config
    }

    // TikTok calls the client identifier `client_key`
    fn augment_authorize_params(&self, params: &mut QueryParams) {
        params.rename("client_id", "client_key");
    }

    fn augment_token_params(&self, params: &mut QueryParams) {
        params.rename("client_id", "client_key");
    }

    async fn build_identity(
        &self,
        context: CallbackContext<'_>,
    ) -> OAuth2Result<NormalizedIdentity> {
        let access_token = context.access_token;

        let uid = access_token
            .param("open_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                OAuth2Error::InvalidTokenResponse("missing `open_id` in token response".into())
            })?
            .to_string();

        if self.config.skip_info {
            return Ok(NormalizedIdentity {
                provider: PROVIDER_ID.to_string(),
                uid,
                info: None,
                credentials: credentials(access_token),
                extra: serde_json::Map::new(),
            });
        }

        let scopes = self.granted_scopes(context.params);
        let loader = UserInfoLoader::new(
            access_token,
            &self.config.userinfo_endpoint,
            UserInfoFields::for_scopes(&scopes),
        );

        let info = self.info(&loader, &scopes).await?;
        let extra = loader.profile().await?.as_map().clone();

        Ok(NormalizedIdentity {
            provider: PROVIDER_ID.to_string(),
            uid,
            info: Some(info),
            credentials: credentials(access_token),
            extra,
        })
    }
}

/// TikTok flow backed by the given state store.
pub fn tiktok_provider(
    config: TikTokConfig,
    oauth2_config: OAuth2Config,
    state_store: Arc<dyn OAuth2StateStore>,
) -> OAuth2Result<OAuth2Flow<TikTokStrategy>> {
    OAuth2Flow::new(oauth2_config, state_store, TikTokStrategy::new(config)?)
}

/// TikTok flow with default timeouts and an in-memory state store.
pub fn tiktok_provider_in_memory(config: TikTokConfig) -> OAuth2Result<OAuth2Flow<TikTokStrategy>> {
    tiktok_provider(
        config,
        OAuth2Config::default(),
        Arc::new(InMemoryStateStore::new()),
    )
}
