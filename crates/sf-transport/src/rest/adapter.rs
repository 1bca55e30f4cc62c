use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use dualforce_auth::{AuthContext, AuthContextProvider, CredentialCache, RestCredentials};
use dualforce_client::{
    parse_backend_error, AutoAuthConfig, CallResult, ClientConfig, Endpoints, Error, ErrorKind,
    Request, Result, RetryBudget, RetryReason, Transport,
};

use super::{ProxyRequest, RestProxy};
use crate::adapter::TransportAdapter;

/// Transport adapter over a [`RestProxy`] with lazy authentication.
pub struct RestAdapter {
    proxy: Arc<dyn RestProxy>,
    cache: CredentialCache,
    endpoints: RwLock<Option<Endpoints>>,
    auto_auth: AutoAuthConfig,
    api_version: Option<String>,
    auth_provider: Option<Arc<dyn AuthContextProvider>>,
}

impl std::fmt::Debug for RestAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAdapter")
            .field("cache", &self.cache)
            .field("auto_auth", &self.auto_auth)
            .finish_non_exhaustive()
    }
}

impl RestAdapter {
    /// Bind to a proxy.
    ///
    /// Fails when the proxy holds no credentials and there is no way to
    /// obtain an [`AuthContext`] for its auth flow.
    pub fn new(
        proxy: Arc<dyn RestProxy>,
        config: &ClientConfig,
        auth_provider: Option<Arc<dyn AuthContextProvider>>,
    ) -> Result<Self> {
        let initial = proxy.settings().credentials();
        let has_ids = config.auto_auth.user_id.is_some() && config.auto_auth.source_id.is_some();
        if initial.is_none() && !has_ids && auth_provider.is_none() {
            return Err(Error::config(
                "REST mode needs proxy credentials or an auth context (user id and source id)",
            ));
        }

        let endpoints = initial
            .as_ref()
            .map(|creds| Endpoints::from_rest_url(&creds.rest_url, config.api_version.as_deref()))
            .transpose()?;

        Ok(Self {
            proxy,
            cache: CredentialCache::new(initial),
            endpoints: RwLock::new(endpoints),
            auto_auth: config.auto_auth.clone(),
            api_version: config.api_version.clone(),
            auth_provider,
        })
    }

    /// Resolve credentials, authenticating if none are cached.
    ///
    /// With `stale` set the cached pair is known to be rejected and a new one
    /// is obtained, unless another call already replaced it.
    async fn ensure_auth(&self, stale: Option<&str>) -> Result<RestCredentials> {
        if stale.is_none() {
            if let Some(creds) = self.cache.get() {
                return Ok(creds);
            }
        }

        let creds = self
            .cache
            .refresh(stale, || self.authenticate(stale))
            .await?;

        let endpoints = Endpoints::from_rest_url(&creds.rest_url, self.api_version.as_deref())?;
        *self
            .endpoints
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(endpoints);
        Ok(creds)
    }

    /// Obtain fresh credentials from the proxy, running its auth flow and
    /// polling its settings until they appear.
    #[instrument(skip(self, stale))]
    async fn authenticate(&self, stale: Option<&str>) -> Result<RestCredentials> {
        let usable = |creds: &RestCredentials| stale.is_none_or(|token| creds.token != token);

        if let Some(creds) = self.proxy.settings().credentials().filter(usable) {
            debug!("using credentials already held by the proxy");
            return Ok(creds);
        }

        let context = self.auth_context()?;
        let flow = async {
            info!(user_id = %context.user_id, "starting REST authentication");
            self.proxy.auth(&context, self.auto_auth.immediate).await?;
            loop {
                if let Some(creds) = self.proxy.settings().credentials().filter(usable) {
                    return Ok(creds);
                }
                tokio::time::sleep(self.auto_auth.poll_interval).await;
            }
        };

        tokio::time::timeout(self.auto_auth.timeout, flow)
            .await
            .map_err(|_| Error::new(ErrorKind::AuthTimeout(self.auto_auth.timeout)))?
    }

    fn auth_context(&self) -> Result<AuthContext> {
        if let (Some(user_id), Some(source_id)) =
            (&self.auto_auth.user_id, &self.auto_auth.source_id)
        {
            return Ok(AuthContext::new(user_id, source_id));
        }
        self.auth_provider
            .as_ref()
            .and_then(|provider| provider.auth_context())
            .ok_or_else(|| Error::config("no user id and source id available for authentication"))
    }
}

/// Proxies report errors as text; most of the time it is JSON.
fn parse_error_text(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl TransportAdapter for RestAdapter {
    fn transport(&self) -> Transport {
        Transport::Rest
    }

    fn endpoints(&self) -> Option<Endpoints> {
        self.endpoints
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn prepare(&self) -> Result<Endpoints> {
        self.ensure_auth(None).await?;
        self.endpoints()
            .ok_or_else(|| Error::config("REST endpoints are not known"))
    }

    async fn ajax(&self, request: Request) -> Result<CallResult> {
        let call_url = request.url_with_params();
        let mut budget = RetryBudget::new();
        let mut creds = self.ensure_auth(None).await?;

        loop {
            debug!(
                method = %request.method,
                url = %call_url,
                attempt = budget.attempt(),
                "rest call"
            );

            let proxied = ProxyRequest {
                url: request.url.clone(),
                method: request.method,
                params: request.params.clone(),
                data: request.body.clone(),
                access_token: creds.token.clone(),
            };

            let text = match self.proxy.ajax_request(proxied).await {
                Ok(payload) => {
                    return Ok(CallResult::success(
                        200,
                        payload,
                        request.method,
                        call_url,
                        Transport::Rest,
                    ));
                }
                Err(text) => text,
            };

            let payload = parse_error_text(&text);
            let parsed = parse_backend_error(&payload);
            let status = parsed.status.unwrap_or(0);
            let err = Error::from_backend(status, parsed, payload).for_call(
                request.method,
                call_url.clone(),
                Transport::Rest,
            );

            if err.is_auth_error() && budget.try_spend(RetryReason::SessionExpired) {
                warn!(status = err.http_status, "REST session expired, re-authenticating");
                match self.ensure_auth(Some(&creds.token)).await {
                    Ok(fresh) => creds = fresh,
                    // Retry with what we hold; a second 401 is returned as is
                    Err(auth_err) => {
                        warn!(error = %auth_err, "REST re-authentication failed");
                    }
                }
                continue;
            }

            return Err(err);
        }
    }
}
