//! OAuth2 error types.

use ras_identity_core::IdentityError;
use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("State not found or expired")]
    StateNotFound,

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    #[error("Token exchange failed ({status:?}): {body}")]
    TokenExchangeFailed { status: Option<u16>, body: String },

    #[error("User info request failed ({status:?}): {body}")]
    UserInfoFailed { status: Option<u16>, body: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Invalid user info response: {0}")]
    InvalidUserInfoResponse(String),

    #[error("Callback error: {0}")]
    CallbackError(String),
}

impl From<OAuth2Error> for IdentityError {
    fn from(error: OAuth2Error) -> Self {
        match error {
            OAuth2Error::ConfigError(msg) => IdentityError::Configuration(msg),
            OAuth2Error::UrlError(e) => IdentityError::Configuration(e.to_string()),
            OAuth2Error::InvalidState | OAuth2Error::StateNotFound => IdentityError::StateMismatch,
            OAuth2Error::MissingAuthorizationCode => IdentityError::MissingAuthorizationCode,
            OAuth2Error::CallbackError(msg) => IdentityError::Callback(msg),
            OAuth2Error::TokenExchangeFailed { status, body } => {
                IdentityError::TokenExchangeFailed { status, body }
            }
            OAuth2Error::InvalidTokenResponse(body) => IdentityError::TokenExchangeFailed {
                status: None,
                body,
            },
            OAuth2Error::UserInfoFailed { status, body } => {
                IdentityError::ProfileFetchFailed { status, body }
            }
            OAuth2Error::InvalidUserInfoResponse(msg) => {
                IdentityError::MalformedProfileResponse(msg)
            }
            // Request failures are reported by their phase; a bare client
            // error only comes from building the HTTP client
            OAuth2Error::HttpError(e) => IdentityError::Configuration(e.to_string()),
            OAuth2Error::SerializationError(e) => IdentityError::SerializationError(e),
        }
    }
}
