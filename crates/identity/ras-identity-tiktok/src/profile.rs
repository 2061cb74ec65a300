//! TikTok user info retrieval.

use crate::scope::UserInfoFields;
use ras_identity_oauth2::{AccessToken, OAuth2Error, OAuth2Result, QueryParams};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::debug;

/// User record exactly as returned by TikTok (`data.user`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    /// Extract `data.user` from a user info response body.
    ///
    /// TikTok reports failures in an `error` object whose `code` is `"ok"` on
    /// success.
    pub fn from_response(body: Value) -> OAuth2Result<Self> {
        if let Some(code) = body
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(Value::as_str)
            .filter(|code| *code != "ok")
        {
            let message = body["error"]["message"].as_str().unwrap_or_default();
            return Err(OAuth2Error::UserInfoFailed {
                status: None,
                body: format!("{}: {}", code, message),
            });
        }

        let data = body.get("data").ok_or_else(|| {
            OAuth2Error::InvalidUserInfoResponse("missing `data` in user info response".into())
        })?;
        let user = data.get("user").and_then(Value::as_object).ok_or_else(|| {
            OAuth2Error::InvalidUserInfoResponse(
                "missing `data.user` in user info response".into(),
            )
        })?;

        Ok(Self(user.clone()))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// A string field that must be present.
    pub fn require_str(&self, field: &str) -> OAuth2Result<&str> {
        self.0.get(field).and_then(Value::as_str).ok_or_else(|| {
            OAuth2Error::InvalidUserInfoResponse(format!("missing `{}` in user info", field))
        })
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Fetches the user profile at most once per callback.
pub struct UserInfoLoader<'a> {
    access_token: &'a AccessToken,
    endpoint: &'a str,
    fields: UserInfoFields,
    profile: OnceCell<UserProfile>,
}

impl<'a> UserInfoLoader<'a> {
    pub fn new(access_token: &'a AccessToken, endpoint: &'a str, fields: UserInfoFields) -> Self {
        Self {
            access_token,
            endpoint,
            fields,
            profile: OnceCell::new(),
        }
    }

    pub fn fields(&self) -> &UserInfoFields {
        &self.fields
    }

    pub async fn profile(&self) -> OAuth2Result<&UserProfile> {
        self.profile
            .get_or_try_init(|| async {
                let fields = self.fields.to_query_value();
                debug!("Requesting TikTok user info fields: {}", fields);

                let mut query = QueryParams::new();
                query.insert("fields", fields);

                let body = self.access_token.get_json(self.endpoint, &query).await?;
                UserProfile::from_response(body)
            })
            .await
    }
}
