//! OAuth 2.0 refresh-token grant.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use dualforce_client::{parse_backend_error, Error, Result};

/// OAuth configuration for a connected app.
#[derive(Clone)]
pub struct OAuthConfig {
    /// Consumer key (client id).
    pub consumer_key: String,
    consumer_secret: Option<String>,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("consumer_key", &self.consumer_key)
            .field(
                "consumer_secret",
                &self.consumer_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl OAuthConfig {
    /// Create a new OAuth config.
    pub fn new(consumer_key: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: None,
        }
    }

    /// Set the consumer secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.consumer_secret = Some(secret.into());
        self
    }
}

/// OAuth client for token refresh.
#[derive(Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    /// Create a new OAuth client.
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a new OAuth client sharing an existing reqwest client.
    pub fn with_http_client(config: OAuthConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The refresh_token parameter is not logged to prevent credential exposure.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
        login_url: &str,
    ) -> Result<TokenResponse> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.consumer_key.as_str()),
        ];

        if let Some(ref secret) = self.config.consumer_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let body = serde_urlencoded::to_string(params)
            .map_err(|e| Error::config(format!("cannot encode token request: {e}")))?;

        let url = format!("{}/services/oauth2/token", login_url.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            let payload = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
            let err = Error::from_backend(status, parse_backend_error(&payload), payload);
            return Err(err);
        }

        response.json().await.map_err(Into::into)
    }
}

/// Token response from OAuth.
///
/// Sensitive fields are redacted in Debug output.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub instance_url: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("instance_url", &self.instance_url)
            .field("token_type", &self.token_type)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_oauth_config_debug_redacts_secret() {
        let config = OAuthConfig::new("key").with_secret("super_secret");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super_secret"));
    }

    #[test]
    fn test_token_response_debug_redacts_tokens() {
        let token = TokenResponse {
            access_token: "00Dxx!secret_access".into(),
            refresh_token: Some("secret_refresh".into()),
            instance_url: "https://na1.salesforce.com".into(),
            token_type: Some("Bearer".into()),
            issued_at: None,
        };
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret_access"));
        assert!(!debug.contains("secret_refresh"));
        assert!(debug.contains("na1.salesforce.com"));
    }

    #[tokio::test]
    async fn test_refresh_token_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("client_id=consumer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-token",
                "instance_url": "https://na1.salesforce.com",
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuthClient::new(OAuthConfig::new("consumer"));
        let token = client.refresh_token("rt", &server.uri()).await.unwrap();

        assert_eq!(token.access_token, "new-token");
        assert_eq!(token.instance_url, "https://na1.salesforce.com");
    }

    #[tokio::test]
    async fn test_refresh_token_oauth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "expired access/refresh token"
            })))
            .mount(&server)
            .await;

        let client = OAuthClient::new(OAuthConfig::new("consumer").with_secret("s"));
        let err = client.refresh_token("rt", &server.uri()).await.unwrap_err();

        assert_eq!(err.http_status, 400);
        assert_eq!(err.code.as_deref(), Some("invalid_grant"));
        assert_eq!(err.message(), "expired access/refresh token");
    }
}
