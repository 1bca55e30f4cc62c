//! Salesforce client.
//!
//! `SalesforceClient` binds one transport at construction and exposes the
//! transport-agnostic operations. Every operation returns a
//! [`ResponseEnvelope`]; how failures surface follows [`ErrorMode`].

use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use tracing::warn;

use dualforce_auth::{AuthContextProvider, RestSettings};
use dualforce_client::security::{datetime, soql};
use dualforce_client::{
    CallResult, ClientConfig, Endpoints, Error, ErrorKind, ErrorMode, Method, Request,
    ResponseEnvelope, Result, Transport,
};
use dualforce_transport::{
    select_transport, CanvasBridge, Collaborators, RestProxy, TransportAdapter,
};

use crate::present::{show_error, Presentation, Presenter, TracingPresenter};

mod apex;
mod composite;
mod crud;
mod query;

/// Salesforce API client over a Canvas bridge or a REST proxy.
///
/// # Example
///
/// ```rust,ignore
/// use dualforce_rest::{QueryRequest, SalesforceClient};
/// use dualforce_auth::RestSettings;
///
/// let client = SalesforceClient::builder()
///     .with_rest_settings(RestSettings::from_env()?)
///     .build()?;
///
/// let contacts = client.query("SELECT Id, Name FROM Contact").await?;
/// for record in contacts.records() {
///     println!("{}", record["Name"]);
/// }
/// ```
#[derive(Clone)]
pub struct SalesforceClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn TransportAdapter>,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("transport", &self.transport.transport())
            .field("endpoints", &self.transport.endpoints())
            .field("config", &self.config)
            .finish()
    }
}

impl SalesforceClient {
    /// Create a client, selecting the transport from `collaborators`.
    pub fn new(config: ClientConfig, collaborators: Collaborators) -> Result<Self> {
        let transport = select_transport(&config, collaborators)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client over an already built transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn TransportAdapter>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Start building a client.
    pub fn builder() -> SalesforceClientBuilder {
        SalesforceClientBuilder::default()
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Transport serving this client.
    pub fn source(&self) -> Transport {
        self.transport.transport()
    }

    /// Endpoints as currently known. In REST mode they are learned on the
    /// first authentication, so this may be `None` before any call.
    pub fn endpoints(&self) -> Option<Endpoints> {
        self.transport.endpoints()
    }

    /// Endpoints, authenticating first if needed.
    pub async fn resolve_endpoints(&self) -> Result<Endpoints> {
        self.transport.prepare().await
    }

    /// Quote a value as a SOQL string literal, e.g. `O'Neil` -> `'O\'Neil'`.
    pub fn escape_soql(value: &str) -> String {
        soql::escape_soql(value)
    }

    /// Alias of [`SalesforceClient::escape_soql`].
    pub fn quote(value: &str) -> String {
        soql::quote(value)
    }

    /// Format an instant as a SOQL datetime literal in UTC.
    pub fn format_date_time<Tz: TimeZone>(value: &DateTime<Tz>) -> String {
        datetime::format_date_time(value)
    }

    /// Show `err` with the default presenter, which logs through tracing.
    pub fn show_error(&self, err: &Error) -> Presentation {
        show_error(err, &TracingPresenter)
    }

    /// Show `err` with a host presenter.
    pub fn show_error_with(&self, err: &Error, presenter: &dyn Presenter) -> Presentation {
        show_error(err, presenter)
    }

    /// Perform one transport call, bounded by `call_timeout` when set.
    pub(crate) async fn call(&self, request: Request) -> Result<CallResult> {
        let Some(limit) = self.config.call_timeout else {
            return self.transport.ajax(request).await;
        };

        let method = request.method;
        let url = request.url_with_params();
        match tokio::time::timeout(limit, self.transport.ajax(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(method = %method, url = %url, ?limit, "call timed out");
                Err(Error::new(ErrorKind::Timeout(limit)).for_call(method, url, self.source()))
            }
        }
    }

    /// Endpoints for an operation about to run, or the operation's outcome
    /// if they cannot be obtained.
    pub(crate) async fn prepare(
        &self,
        method: Method,
    ) -> std::result::Result<Endpoints, Result<ResponseEnvelope>> {
        self.transport
            .prepare()
            .await
            .map_err(|err| self.finish(Err(err), method, ""))
    }

    /// Endpoints-dependent single call whose data is the payload itself.
    pub(crate) async fn dispatch<F>(&self, method: Method, build: F) -> Result<ResponseEnvelope>
    where
        F: FnOnce(&Endpoints) -> Request,
    {
        let endpoints = match self.prepare(method).await {
            Ok(endpoints) => endpoints,
            Err(outcome) => return outcome,
        };
        self.send(build(&endpoints)).await
    }

    pub(crate) async fn send(&self, request: Request) -> Result<ResponseEnvelope> {
        let method = request.method;
        let url = request.url_with_params();
        let outcome = self.call(request).await.map(ResponseEnvelope::from_call);
        self.finish(outcome, method, &url)
    }

    /// Apply the error mode. Configuration and validation errors are always
    /// returned as `Err`.
    pub(crate) fn finish(
        &self,
        outcome: Result<ResponseEnvelope>,
        method: Method,
        url: &str,
    ) -> Result<ResponseEnvelope> {
        match outcome {
            Ok(envelope) => Ok(envelope),
            Err(err) if err.is_config_error() || self.config.error_mode == ErrorMode::Throw => {
                Err(err)
            }
            Err(err) => Ok(ResponseEnvelope::from_error(&err, method, url, self.source())),
        }
    }
}

/// Builder for [`SalesforceClient`].
#[derive(Debug, Default)]
pub struct SalesforceClientBuilder {
    config: ClientConfig,
    collaborators: Collaborators,
}

impl SalesforceClientBuilder {
    /// Use this configuration.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Supply the Canvas host bridge.
    pub fn with_canvas(mut self, bridge: Arc<dyn CanvasBridge>) -> Self {
        self.collaborators = self.collaborators.with_canvas(bridge);
        self
    }

    /// Supply a REST proxy.
    pub fn with_rest_proxy(mut self, proxy: Arc<dyn RestProxy>) -> Self {
        self.collaborators = self.collaborators.with_rest_proxy(proxy);
        self
    }

    /// Supply an explicit instance URL and token for REST mode.
    pub fn with_rest_settings(mut self, settings: RestSettings) -> Self {
        self.collaborators = self.collaborators.with_rest_settings(settings);
        self
    }

    /// Supply the source of user and source ids for REST authentication.
    pub fn with_auth_provider(mut self, provider: Arc<dyn AuthContextProvider>) -> Self {
        self.collaborators = self.collaborators.with_auth_provider(provider);
        self
    }

    /// Select the transport and build the client.
    pub fn build(self) -> Result<SalesforceClient> {
        SalesforceClient::new(self.config, self.collaborators)
    }
}
