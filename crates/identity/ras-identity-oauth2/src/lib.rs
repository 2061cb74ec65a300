//! Generic OAuth2 authorization code flow.
//!
//! [`OAuth2Flow`] drives the request and callback phases: it stores the
//! anti-forgery state for the caller's session, validates it on callback,
//! exchanges the code for an [`AccessToken`] and hands that token to a
//! [`ProviderStrategy`], which fetches and maps the provider's profile.
//! Provider adapters only implement the strategy.

mod client;
mod config;
mod error;
mod flow;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use client::{AccessToken, OAuth2Client};
pub use config::{AuthScheme, OAuth2Config, OAuth2ProviderConfig};
pub use error::{OAuth2Error, OAuth2Result};
pub use flow::{CallbackContext, OAuth2Flow, ProviderStrategy};
pub use state::{InMemoryStateStore, OAuth2State, OAuth2StateStore, session_key};
pub use types::{CallbackParams, QueryParams, TokenResponse};

// Re-export common types for convenience
pub use ras_identity_core::{IdentityProvider, NormalizedIdentity};
