//! Integration and security tests for the generic flow.

#[cfg(test)]
mod integration_tests {
    use crate::{
        CallbackContext, InMemoryStateStore, OAuth2Config, OAuth2Error, OAuth2Flow,
        OAuth2ProviderConfig, OAuth2Result, ProviderStrategy, QueryParams,
    };
    use async_trait::async_trait;
    use ras_identity_core::{
        AuthorizeRequest, CallbackRequest, IdentityCredentials, IdentityError, IdentityInfo,
        IdentityProvider, NormalizedIdentity,
    };
    use std::collections::HashMap;
    use std::sync::Arc;
    use url::Url;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Minimal OpenID-style strategy used to exercise the flow
    struct UserInfoStrategy {
        config: OAuth2ProviderConfig,
        userinfo_endpoint: String,
    }

    #[async_trait]
    impl ProviderStrategy for UserInfoStrategy {
        fn provider_config(&self) -> &OAuth2ProviderConfig {
            &self.config
        }

        fn augment_authorize_params(&self, params: &mut QueryParams) {
            params.insert("prompt", "consent");
        }

        fn augment_token_params(&self, params: &mut QueryParams) {
            params.insert("audience", "tests");
        }

        async fn build_identity(
            &self,
            context: CallbackContext<'_>,
        ) -> OAuth2Result<NormalizedIdentity> {
            let profile = context
                .access_token
                .get_json(&self.userinfo_endpoint, &QueryParams::new())
                .await?;

            let sub = profile["sub"].as_str().ok_or_else(|| {
                OAuth2Error::InvalidUserInfoResponse("missing sub".to_string())
            })?;

            Ok(NormalizedIdentity {
                provider: self.config.provider_id.clone(),
                uid: sub.to_string(),
                info: Some(IdentityInfo::new(
                    profile["name"].as_str().unwrap_or_default(),
                    profile["picture"].as_str().unwrap_or_default(),
                )),
                credentials: IdentityCredentials {
                    token: context.access_token.token().to_string(),
                    refresh_token: context.access_token.refresh_token().map(String::from),
                    expires: context.access_token.expires(),
                    expires_at: context.access_token.expires_at(),
                },
                extra: profile.as_object().cloned().unwrap_or_default(),
            })
        }
    }

    async fn setup_flow() -> (MockServer, OAuth2Flow<UserInfoStrategy>) {
        let mock_server = MockServer::start().await;

        let config = OAuth2ProviderConfig::new(
            "mock_provider",
            "mock_client_id",
            "mock_secret",
            format!("{}/authorize", mock_server.uri()),
            format!("{}/token", mock_server.uri()),
        )
        .with_scopes(vec!["openid".to_string(), "email".to_string()], " ");

        let strategy = UserInfoStrategy {
            config,
            userinfo_endpoint: format!("{}/userinfo", mock_server.uri()),
        };

        let flow = OAuth2Flow::new(
            OAuth2Config::default(),
            Arc::new(InMemoryStateStore::new()),
            strategy,
        )
        .unwrap();

        (mock_server, flow)
    }

    fn callback(session_id: &str, pairs: &[(&str, &str)]) -> CallbackRequest {
        CallbackRequest {
            session_id: session_id.to_string(),
            params: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn authorize(session_id: &str) -> AuthorizeRequest {
        AuthorizeRequest {
            session_id: session_id.to_string(),
            host_url: "http://localhost:3000".to_string(),
        }
    }

    #[tokio::test]
    async fn test_full_oauth2_flow() {
        let (mock_server, flow) = setup_flow().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=mock_auth_code"))
            .and(body_string_contains("audience=tests"))
            .and(body_string_contains(
                "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fmock_provider%2Fcallback",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "mock_access_token",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "mock_refresh_token",
                "scope": "openid email"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("Authorization", "Bearer mock_access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "12345",
                "name": "Test User",
                "picture": "https://example.com/photo.jpg"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let redirect = flow.authorize(authorize("session")).await.unwrap();

        let url = Url::parse(&redirect.location).unwrap();
        assert_eq!(url.path(), "/authorize");
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params.get("prompt").map(String::as_str), Some("consent"));
        assert_eq!(params.get("state"), Some(&redirect.state));

        let identity = flow
            .callback(callback(
                "session",
                &[("code", "mock_auth_code"), ("state", redirect.state.as_str())],
            ))
            .await
            .unwrap();

        assert_eq!(identity.provider, "mock_provider");
        assert_eq!(identity.uid, "12345");
        assert_eq!(identity.info.unwrap().name, "Test User");
        assert_eq!(identity.credentials.token, "mock_access_token");
        assert_eq!(
            identity.credentials.refresh_token.as_deref(),
            Some("mock_refresh_token")
        );
        assert!(identity.credentials.expires);
    }

    #[tokio::test]
    async fn test_state_mismatch_makes_no_outbound_call() {
        let (mock_server, flow) = setup_flow().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        flow.authorize(authorize("session")).await.unwrap();

        let result = flow
            .callback(callback(
                "session",
                &[("code", "code"), ("state", "invalid_state")],
            ))
            .await;
        assert!(matches!(result, Err(IdentityError::StateMismatch)));

        // Missing state entirely, on a session that never started a flow
        let result = flow
            .callback(callback("other-session", &[("code", "code")]))
            .await;
        assert!(matches!(result, Err(IdentityError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_provider_error_and_missing_code() {
        let (mock_server, flow) = setup_flow().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let redirect = flow.authorize(authorize("session")).await.unwrap();
        let result = flow
            .callback(callback(
                "session",
                &[
                    ("state", redirect.state.as_str()),
                    ("error", "access_denied"),
                    ("error_description", "User cancelled"),
                ],
            ))
            .await;
        match result {
            Err(IdentityError::Callback(msg)) => {
                assert_eq!(msg, "access_denied: User cancelled");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let redirect = flow.authorize(authorize("session")).await.unwrap();
        let result = flow
            .callback(callback("session", &[("state", redirect.state.as_str())]))
            .await;
        assert!(matches!(result, Err(IdentityError::MissingAuthorizationCode)));
    }

    #[tokio::test]
    async fn test_token_exchange_failure_is_surfaced() {
        let (mock_server, flow) = setup_flow().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let redirect = flow.authorize(authorize("session")).await.unwrap();
        let result = flow
            .callback(callback(
                "session",
                &[("code", "bad"), ("state", redirect.state.as_str())],
            ))
            .await;

        assert!(matches!(
            result,
            Err(IdentityError::TokenExchangeFailed {
                status: Some(400),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_state_parameter_security() {
        let (_mock_server, flow) = setup_flow().await;

        let first = flow.authorize(authorize("a")).await.unwrap();
        let second = flow.authorize(authorize("b")).await.unwrap();

        assert_ne!(first.state, second.state);
        assert_eq!(first.state.len(), 36);
    }

    #[tokio::test]
    async fn test_concurrent_state_handling() {
        use tokio::task;

        let (_mock_server, flow) = setup_flow().await;
        let flow = Arc::new(flow);

        let mut handles = vec![];
        for i in 0..10 {
            let flow = flow.clone();
            handles.push(task::spawn(async move {
                flow.request_phase(&format!("session-{}", i), "http://localhost")
                    .await
            }));
        }

        let mut states = vec![];
        for handle in handles {
            states.push(handle.await.unwrap().unwrap().state);
        }

        let unique_states: std::collections::HashSet<_> = states.iter().collect();
        assert_eq!(unique_states.len(), states.len());
    }

    #[test]
    fn test_flow_requires_client_credentials() {
        let config = OAuth2ProviderConfig::new(
            "mock_provider",
            "",
            "secret",
            "https://example.com/authorize",
            "https://example.com/token",
        );
        let strategy = UserInfoStrategy {
            config,
            userinfo_endpoint: "https://example.com/userinfo".to_string(),
        };

        let result = OAuth2Flow::new(
            OAuth2Config::default(),
            Arc::new(InMemoryStateStore::new()),
            strategy,
        );
        assert!(matches!(result, Err(OAuth2Error::ConfigError(_))));
    }
}
