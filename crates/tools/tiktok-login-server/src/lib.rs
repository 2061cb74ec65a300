//! HTTP front end for the TikTok Login Kit provider.
//!
//! Routes (with the default `/auth` prefix):
//! - `GET /auth/tiktok-loginkit` redirects to TikTok
//! - `GET /auth/tiktok-loginkit/callback` completes the flow and returns the
//!   normalized identity as JSON
//! - `GET /health`

pub mod config;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
    routing::get,
};
use ras_identity_core::{AuthorizeRequest, CallbackRequest, IdentityError, IdentityProvider};
use ras_identity_oauth2::{OAuth2Flow, ProviderStrategy};
use ras_identity_tiktok::TikTokStrategy;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tower_cookies::{Cookie, CookieManagerLayer, Cookies, cookie::SameSite};
use tracing::{info, warn};

pub use config::AppConfig;

pub const SESSION_COOKIE: &str = "tiktok_login_session";

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<OAuth2Flow<TikTokStrategy>>,
    /// Externally visible base URL, used to build the callback URL
    pub public_url: String,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(provider: OAuth2Flow<TikTokStrategy>, public_url: impl Into<String>) -> Self {
        let public_url = public_url.into();
        Self {
            provider: Arc::new(provider),
            secure_cookies: public_url.starts_with("https://"),
            public_url,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let provider_config = state.provider.strategy().provider_config();
    let request_path = provider_config.request_path();
    let callback_path = provider_config.callback_path();

    Router::new()
        .route("/health", get(health))
        .route(&request_path, get(request_phase))
        .route(&callback_path, get(callback_phase))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn request_phase(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Response, ApiError> {
    let session_id = match cookies.get(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => {
            let session_id = uuid::Uuid::new_v4().to_string();
            cookies.add(session_cookie(session_id.clone(), state.secure_cookies));
            session_id
        }
    };

    let redirect = state
        .provider
        .authorize(AuthorizeRequest {
            session_id,
            host_url: state.public_url.clone(),
        })
        .await?;

    Ok((StatusCode::FOUND, [(LOCATION, redirect.location)]).into_response())
}

async fn callback_phase(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let Some(session_id) = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
        warn!("Callback received without a session cookie");
        return Err(ApiError(IdentityError::StateMismatch));
    };

    let identity = state
        .provider
        .callback(CallbackRequest { session_id, params })
        .await?;

    info!("Signed in {} user {}", identity.provider, identity.uid);
    Ok(Json(identity).into_response())
}

fn session_cookie(value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie
}

/// Maps provider failures onto HTTP responses.
pub struct ApiError(pub IdentityError);

impl From<IdentityError> for ApiError {
    fn from(error: IdentityError) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            IdentityError::StateMismatch
            | IdentityError::MissingAuthorizationCode
            | IdentityError::Callback(_) => StatusCode::BAD_REQUEST,
            IdentityError::TokenExchangeFailed { .. }
            | IdentityError::ProfileFetchFailed { .. }
            | IdentityError::MalformedProfileResponse(_) => StatusCode::BAD_GATEWAY,
            IdentityError::Configuration(_) | IdentityError::SerializationError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self.0 {
            IdentityError::Configuration(_) => "configuration",
            IdentityError::StateMismatch => "csrf_detected",
            IdentityError::MissingAuthorizationCode => "missing_code",
            IdentityError::Callback(_) => "provider_error",
            IdentityError::TokenExchangeFailed { .. } => "token_exchange_failed",
            IdentityError::ProfileFetchFailed { .. } => "profile_fetch_failed",
            IdentityError::MalformedProfileResponse(_) => "malformed_profile",
            IdentityError::SerializationError(_) => "serialization",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Login failed: {}", self.0);
        }

        let body = json!({
            "error": self.kind(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
