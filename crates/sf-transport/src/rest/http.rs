use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use dualforce_auth::{
    AuthContext, OAuthClient, OAuthConfig, RestCredentials, RestSettings, PRODUCTION_LOGIN_URL,
};
use dualforce_client::{append_query, ClientConfig, Error, ErrorKind, Result, DEFAULT_API_VERSION};

use super::{ProxyRequest, ProxySettings, RestProxy};

/// Refresh-token grant parameters.
struct Refresh {
    oauth: OAuthClient,
    refresh_token: String,
    login_url: String,
}

/// REST proxy that calls Salesforce directly with reqwest.
///
/// Errors are reported the way proxies in front of Salesforce usually do: a
/// JSON-encoded array of `{message, errorCode, statusCode}`. When a refresh
/// token and consumer key are configured, [`RestProxy::auth`] runs the OAuth
/// refresh-token grant.
pub struct HttpRestProxy {
    http: reqwest::Client,
    settings: RwLock<ProxySettings>,
    api_version: String,
    refresh: Option<Refresh>,
}

impl std::fmt::Debug for HttpRestProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRestProxy")
            .field("settings", &self.settings())
            .field("api_version", &self.api_version)
            .field("can_refresh", &self.refresh.is_some())
            .finish()
    }
}

impl HttpRestProxy {
    /// Create a proxy from explicit settings.
    pub fn new(settings: RestSettings, config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        let initial = if settings.instance_url.is_empty() || settings.access_token.is_empty() {
            ProxySettings::default()
        } else {
            let creds = settings.credentials();
            ProxySettings::new(creds.rest_url, creds.token)
        };

        let refresh = match (&settings.refresh_token, &settings.client_id) {
            (Some(refresh_token), Some(client_id)) => Some(Refresh {
                oauth: OAuthClient::with_http_client(OAuthConfig::new(client_id), http.clone()),
                refresh_token: refresh_token.clone(),
                login_url: settings
                    .login_url
                    .clone()
                    .unwrap_or_else(|| PRODUCTION_LOGIN_URL.to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            http,
            settings: RwLock::new(initial),
            api_version: if settings.api_version.is_empty() {
                DEFAULT_API_VERSION.to_string()
            } else {
                settings.api_version
            },
            refresh,
        })
    }

    /// Create a proxy from `SF_*` environment variables.
    pub fn from_env(config: &ClientConfig) -> Result<Self> {
        Self::new(RestSettings::from_env()?, config)
    }

    fn set_settings(&self, settings: ProxySettings) {
        *self
            .settings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings;
    }
}

/// Error text in the proxy's conventional shape.
fn error_text(status: u16, payload: &Value) -> String {
    let items = match payload {
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| {
                let mut item = item.clone();
                if let Value::Object(map) = &mut item {
                    map.entry("statusCode").or_insert(json!(status));
                }
                item
            })
            .collect(),
        Value::Object(_) => return error_text(status, &Value::Array(vec![payload.clone()])),
        Value::String(text) if !text.is_empty() => {
            vec![json!({"message": text, "statusCode": status})]
        }
        _ => vec![json!({"message": format!("HTTP {status}"), "statusCode": status})],
    };
    Value::Array(items).to_string()
}

#[async_trait]
impl RestProxy for HttpRestProxy {
    fn settings(&self) -> ProxySettings {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn ajax_request(&self, request: ProxyRequest) -> std::result::Result<Value, String> {
        let url = append_query(&request.url, &request.params);
        let mut req = self
            .http
            .request(request.method.to_reqwest(), &url)
            .bearer_auth(&request.access_token)
            .header("Accept", "application/json");

        if let Some(ref data) = request.data {
            req = req.json(data);
        }

        let response = req.send().await.map_err(|e| {
            debug!(error = %e, "REST proxy request failed");
            error_text(0, &Value::String(e.to_string()))
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            debug!(status, error = %e, "REST proxy response body unreadable");
            error_text(0, &Value::String(format!("cannot read response body: {e}")))
        })?;
        let payload = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if (200..300).contains(&status) {
            Ok(payload)
        } else {
            Err(error_text(status, &payload))
        }
    }

    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    async fn auth(&self, context: &AuthContext, _immediate: bool) -> Result<()> {
        let Some(refresh) = &self.refresh else {
            return Err(Error::config(
                "HTTP REST proxy cannot authenticate without a refresh token and client id",
            ));
        };

        let token = refresh
            .oauth
            .refresh_token(&refresh.refresh_token, &refresh.login_url)
            .await?;
        let creds = RestCredentials::from_instance(
            &token.instance_url,
            &self.api_version,
            token.access_token,
        );
        info!(instance_url = %token.instance_url, "access token refreshed");
        self.set_settings(ProxySettings::new(creds.rest_url, creds.token));
        Ok(())
    }
}
