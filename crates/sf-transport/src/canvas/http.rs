use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use dualforce_client::{ClientConfig, Error, ErrorKind, Result};

use super::{BridgeResponse, CanvasAjax, CanvasBridge, CanvasClient, CanvasContext};

/// Bridge that performs Canvas calls directly over HTTP with the Canvas
/// client's OAuth token.
///
/// Useful outside the Canvas iframe (server-side rendering, tests) when the
/// host has handed over its signed-request context. The host rotates the
/// token with [`HttpCanvasBridge::set_client`].
pub struct HttpCanvasBridge {
    http: reqwest::Client,
    context: CanvasContext,
    client: RwLock<CanvasClient>,
}

impl std::fmt::Debug for HttpCanvasBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCanvasBridge")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl HttpCanvasBridge {
    /// Create a bridge for `context`, authenticated as `client`.
    pub fn new(
        context: CanvasContext,
        client: CanvasClient,
        config: &ClientConfig,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self {
            http,
            context,
            client: RwLock::new(client),
        })
    }

    /// Replace the client handle, e.g. after the host re-signed the request.
    pub fn set_client(&self, client: CanvasClient) {
        *self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = client;
    }
}

#[async_trait]
impl CanvasBridge for HttpCanvasBridge {
    fn context(&self) -> Option<CanvasContext> {
        Some(self.context.clone())
    }

    async fn client(&self, _refresh: bool) -> Result<CanvasClient> {
        Ok(self
            .client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    async fn ajax(
        &self,
        url: &str,
        call: CanvasAjax,
    ) -> std::result::Result<BridgeResponse, BridgeResponse> {
        let mut req = self
            .http
            .request(call.method.to_reqwest(), url)
            .bearer_auth(&call.client.oauth_token)
            .header("Accept", "application/json");

        for (name, value) in &call.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(data) = call.data {
            req = req.header("Content-Type", call.content_type.as_str()).body(data);
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "canvas bridge request failed");
                return Err(BridgeResponse::new(0, Value::String(e.to_string())));
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!(status, error = %e, "canvas bridge response body unreadable");
                return Err(BridgeResponse::new(
                    0,
                    Value::String(format!("cannot read response body: {e}")),
                ));
            }
        };
        let payload = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        let reply = BridgeResponse::new(status, payload);
        if reply.is_success() {
            Ok(reply)
        } else {
            Err(reply)
        }
    }
}
