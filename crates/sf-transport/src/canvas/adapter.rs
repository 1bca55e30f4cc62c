use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use dualforce_client::{
    append_query, parse_backend_error, CallResult, Endpoints, Error, Method, Request, Result,
    RetryBudget, RetryReason, Transport,
};

use super::{CanvasAjax, CanvasBridge};
use crate::adapter::TransportAdapter;
use crate::{OVERRIDE_HEADER, OVERRIDE_PARAM};

const CONTENT_TYPE: &str = "application/json";

/// Transport adapter over a [`CanvasBridge`].
pub struct CanvasAdapter {
    bridge: Arc<dyn CanvasBridge>,
    endpoints: Endpoints,
}

impl std::fmt::Debug for CanvasAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasAdapter")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl CanvasAdapter {
    /// Bind to a bridge. Fails when the bridge has no Canvas context.
    pub fn new(bridge: Arc<dyn CanvasBridge>, api_version: Option<&str>) -> Result<Self> {
        let context = bridge
            .context()
            .ok_or_else(|| Error::config("Canvas context is not available"))?;
        let endpoints = Endpoints::from_canvas(
            &context.instance_url,
            context.rest_link.as_deref(),
            api_version,
        )?;
        Ok(Self { bridge, endpoints })
    }
}

#[async_trait]
impl TransportAdapter for CanvasAdapter {
    fn transport(&self) -> Transport {
        Transport::Canvas
    }

    fn endpoints(&self) -> Option<Endpoints> {
        Some(self.endpoints.clone())
    }

    async fn prepare(&self) -> Result<Endpoints> {
        Ok(self.endpoints.clone())
    }

    async fn ajax(&self, request: Request) -> Result<CallResult> {
        let call_url = request.url_with_params();
        let data = request
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut budget = RetryBudget::new();
        let mut client = self.bridge.client(false).await?;

        loop {
            let (method, url, headers) = if budget.uses_override() {
                let verb = request.method.as_str();
                let mut params = request.params.clone();
                params.push((OVERRIDE_PARAM.to_string(), verb.to_string()));
                (
                    Method::Post,
                    append_query(&request.url, &params),
                    vec![(OVERRIDE_HEADER.to_string(), verb.to_string())],
                )
            } else {
                (request.method, call_url.clone(), Vec::new())
            };

            debug!(
                method = %method,
                url = %url,
                attempt = budget.attempt(),
                override_step = budget.override_step(),
                "canvas call"
            );

            let ajax = CanvasAjax {
                client: client.clone(),
                method,
                content_type: CONTENT_TYPE.to_string(),
                headers,
                data: data.clone(),
            };

            let response = match self.bridge.ajax(&url, ajax).await {
                Ok(response) if response.is_success() => {
                    return Ok(CallResult::success(
                        response.status,
                        response.payload,
                        request.method,
                        call_url,
                        Transport::Canvas,
                    ));
                }
                Ok(response) | Err(response) => response,
            };

            let parsed = parse_backend_error(&response.payload);
            let err = Error::from_backend(response.status, parsed, response.payload)
                .for_call(request.method, call_url.clone(), Transport::Canvas);

            if err.is_method_not_allowed()
                && request.method != Method::Post
                && budget.try_spend(RetryReason::MethodOverride)
            {
                warn!(
                    method = %request.method,
                    "verb refused by host, resending as POST with override"
                );
                continue;
            }

            if err.is_auth_error() && budget.try_spend(RetryReason::SessionExpired) {
                warn!(status = err.http_status, "canvas session expired, refreshing client");
                match self.bridge.client(true).await {
                    Ok(fresh) => client = fresh,
                    Err(refresh_err) => {
                        warn!(error = %refresh_err, "canvas client refresh failed");
                    }
                }
                continue;
            }

            return Err(err);
        }
    }
}
