//! REST proxy transport.

mod adapter;
mod http;

pub use adapter::RestAdapter;
pub use http::HttpRestProxy;

use async_trait::async_trait;
use serde_json::Value;

use dualforce_auth::{AuthContext, RestCredentials};
use dualforce_client::{Method, Result};

/// Credentials the proxy currently holds.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    /// REST base URL, e.g. `https://na1.salesforce.com/services/data/v61.0/`.
    pub rest_url: Option<String>,
    /// Bearer token. Redacted from `Debug` output.
    pub token: Option<String>,
}

impl std::fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxySettings")
            .field("rest_url", &self.rest_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ProxySettings {
    /// Settings holding both a REST base URL and a token.
    pub fn new(rest_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            rest_url: Some(rest_url.into()),
            token: Some(token.into()),
        }
    }

    /// The pair, when both halves are present.
    pub fn credentials(&self) -> Option<RestCredentials> {
        match (&self.rest_url, &self.token) {
            (Some(rest_url), Some(token)) => {
                Some(RestCredentials::new(rest_url.as_str(), token.as_str()))
                    .filter(RestCredentials::is_valid)
            }
            _ => None,
        }
    }
}

/// One call handed to the proxy's request primitive.
#[derive(Clone)]
pub struct ProxyRequest {
    /// URL without the query string.
    pub url: String,
    /// Verb of the call.
    pub method: Method,
    /// Query parameters, appended in order.
    pub params: Vec<(String, String)>,
    /// JSON body, if any.
    pub data: Option<Value>,
    /// Bearer token for this attempt.
    pub access_token: String,
}

impl std::fmt::Debug for ProxyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyRequest")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("params", &self.params)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// A REST proxy: a settings holder, a request primitive and an auth flow.
#[async_trait]
pub trait RestProxy: Send + Sync {
    /// Current `{rest_url, token}`; re-read on every use.
    fn settings(&self) -> ProxySettings;

    /// Perform one call. Errors come back as the proxy's error text, usually
    /// a JSON-encoded array of `{message, errorCode, statusCode}`.
    async fn ajax_request(&self, request: ProxyRequest) -> std::result::Result<Value, String>;

    /// Start the authentication flow for `context`. Completion is observed
    /// through [`RestProxy::settings`].
    async fn auth(&self, context: &AuthContext, immediate: bool) -> Result<()>;
}
