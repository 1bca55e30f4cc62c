//! Canvas host bridge.

mod adapter;
mod http;

pub use adapter::CanvasAdapter;
pub use http::HttpCanvasBridge;

use async_trait::async_trait;
use serde_json::Value;

use dualforce_client::{Method, Result};

/// What the Canvas host exposes about the embedding org.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasContext {
    /// Instance origin, e.g. `https://acme.my.salesforce.com`.
    pub instance_url: String,
    /// The context's REST link, e.g. `/services/data/v61.0/`.
    pub rest_link: Option<String>,
}

impl CanvasContext {
    /// Context for an instance origin, without a REST link.
    pub fn new(instance_url: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into(),
            rest_link: None,
        }
    }

    /// Set the REST link the host reported.
    pub fn with_rest_link(mut self, rest_link: impl Into<String>) -> Self {
        self.rest_link = Some(rest_link.into());
        self
    }
}

/// Authenticated client handle issued by the Canvas host.
#[derive(Clone, PartialEq, Eq)]
pub struct CanvasClient {
    /// Instance origin the token was issued for.
    pub instance_url: String,
    /// OAuth access token. Redacted from `Debug` output.
    pub oauth_token: String,
}

impl std::fmt::Debug for CanvasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasClient")
            .field("instance_url", &self.instance_url)
            .field("oauth_token", &"[REDACTED]")
            .finish()
    }
}

impl CanvasClient {
    /// Client handle for an instance and token.
    pub fn new(instance_url: impl Into<String>, oauth_token: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into(),
            oauth_token: oauth_token.into(),
        }
    }
}

/// Settings of one bridge `ajax` call.
#[derive(Debug, Clone)]
pub struct CanvasAjax {
    /// Client handle the call authenticates with.
    pub client: CanvasClient,
    /// Verb sent to the host.
    pub method: Method,
    /// `Content-Type` of `data`.
    pub content_type: String,
    /// Extra request headers, e.g. the verb override marker.
    pub headers: Vec<(String, String)>,
    /// JSON-encoded body.
    pub data: Option<String>,
}

/// What the bridge reports back for a call, on either callback.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeResponse {
    /// HTTP status, 0 when no response arrived.
    pub status: u16,
    /// Decoded body, or the raw text when it is not JSON.
    pub payload: Value,
}

impl BridgeResponse {
    /// Response with a status and payload.
    pub fn new(status: u16, payload: Value) -> Self {
        Self { status, payload }
    }

    /// True for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The Canvas host's client, context and ajax primitives.
///
/// `ajax` resolves `Ok` on the bridge's success callback and `Err` on its
/// error callback. The success callback may still carry a non-2xx status.
#[async_trait]
pub trait CanvasBridge: Send + Sync {
    /// The embedding context, if this code runs inside a Canvas frame.
    fn context(&self) -> Option<CanvasContext>;

    /// The current client handle; `refresh` asks the host for a fresh one.
    async fn client(&self, refresh: bool) -> Result<CanvasClient>;

    /// Perform one call through the host.
    async fn ajax(
        &self,
        url: &str,
        call: CanvasAjax,
    ) -> std::result::Result<BridgeResponse, BridgeResponse>;
}
