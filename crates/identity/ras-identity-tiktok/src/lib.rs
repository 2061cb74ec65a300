//! TikTok Login Kit identity provider.
//!
//! Plugs TikTok's OAuth2 variant into the generic flow from
//! `ras-identity-oauth2`:
//!
//! - the client identifier travels as `client_key`, and the token request
//!   carries the credentials in its body;
//! - the user info fields requested depend on the scopes the user granted
//!   (`user.info.basic`, `user.info.profile`, `user.info.stats`);
//! - the `uid` of the resulting identity is the token's `open_id`.
//!
//! ```no_run
//! use ras_identity_tiktok::{TikTokConfig, tiktok_provider_in_memory};
//!
//! let config = TikTokConfig::new("client-key", "client-secret")
//!     .with_scope("user.info.basic,user.info.profile");
//! let provider = tiktok_provider_in_memory(config)?;
//! # Ok::<(), ras_identity_oauth2::OAuth2Error>(())
//! ```

mod config;
mod profile;
mod scope;
mod strategy;

pub use config::{
    AUTHORIZATION_ENDPOINT, PROVIDER_ID, TOKEN_ENDPOINT, TikTokConfig, USER_INFO_ENDPOINT,
};
pub use profile::{UserInfoLoader, UserProfile};
pub use scope::{
    BASE_FIELDS, GrantedScopes, PROFILE_FIELDS, SCOPE_BASIC, SCOPE_PROFILE, SCOPE_STATS,
    STATS_FIELDS, UserInfoFields,
};
pub use strategy::{
    DEEP_LINK_LABEL, TikTokStrategy, WEB_LINK_LABEL, tiktok_provider, tiktok_provider_in_memory,
};
