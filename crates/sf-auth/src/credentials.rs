//! REST-mode credentials and the cache shared by every call of one client.
//!
//! All credential types implement custom Debug to redact sensitive data.

use std::future::Future;
use std::sync::RwLock;

use tokio::sync::Mutex;
use tracing::{debug, info};

use dualforce_client::{Error, Result, DEFAULT_API_VERSION};

/// A resolved `{token, rest_url}` pair.
#[derive(Clone, PartialEq, Eq)]
pub struct RestCredentials {
    /// REST base URL, e.g. `https://na1.salesforce.com/services/data/v61.0/`.
    pub rest_url: String,
    /// Bearer token.
    pub token: String,
}

impl std::fmt::Debug for RestCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestCredentials")
            .field("rest_url", &self.rest_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl RestCredentials {
    /// Create a new credential pair.
    pub fn new(rest_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            rest_url: rest_url.into(),
            token: token.into(),
        }
    }

    /// Build a pair from an instance URL and a version such as `"61.0"`.
    pub fn from_instance(instance_url: &str, api_version: &str, token: impl Into<String>) -> Self {
        let version = api_version.trim_start_matches(['v', 'V']);
        Self::new(
            format!(
                "{}/services/data/v{}/",
                instance_url.trim_end_matches('/'),
                version
            ),
            token,
        )
    }

    /// Both halves are present.
    pub fn is_valid(&self) -> bool {
        !self.rest_url.is_empty() && !self.token.is_empty()
    }
}

/// Settings for talking to the REST API directly, typically read from the
/// environment.
#[derive(Clone, Default)]
pub struct RestSettings {
    pub instance_url: String,
    pub access_token: String,
    pub api_version: String,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub login_url: Option<String>,
}

impl std::fmt::Debug for RestSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestSettings")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("client_id", &self.client_id)
            .field("login_url", &self.login_url)
            .finish()
    }
}

impl RestSettings {
    /// Create settings from an instance URL and access token.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            ..Default::default()
        }
    }

    /// Load settings from environment variables.
    ///
    /// Required environment variables:
    /// - `SF_INSTANCE_URL` or `SALESFORCE_INSTANCE_URL`
    /// - `SF_ACCESS_TOKEN` or `SALESFORCE_ACCESS_TOKEN`
    ///
    /// Optional:
    /// - `SF_API_VERSION` or `SALESFORCE_API_VERSION` (default: "61.0")
    /// - `SF_REFRESH_TOKEN`, `SF_CLIENT_ID`, `SF_LOGIN_URL`
    pub fn from_env() -> Result<Self> {
        let var = |primary: &str, fallback: &str| {
            std::env::var(primary)
                .or_else(|_| std::env::var(fallback))
                .ok()
                .filter(|v| !v.is_empty())
        };

        let instance_url = var("SF_INSTANCE_URL", "SALESFORCE_INSTANCE_URL")
            .ok_or_else(|| Error::config("environment variable not set: SF_INSTANCE_URL"))?;
        let access_token = var("SF_ACCESS_TOKEN", "SALESFORCE_ACCESS_TOKEN")
            .ok_or_else(|| Error::config("environment variable not set: SF_ACCESS_TOKEN"))?;

        Ok(Self {
            instance_url,
            access_token,
            api_version: var("SF_API_VERSION", "SALESFORCE_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            refresh_token: var("SF_REFRESH_TOKEN", "SALESFORCE_REFRESH_TOKEN"),
            client_id: var("SF_CLIENT_ID", "SALESFORCE_CLIENT_ID"),
            login_url: var("SF_LOGIN_URL", "SALESFORCE_LOGIN_URL"),
        })
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Enable OAuth refresh with a refresh token and consumer key.
    pub fn with_refresh(
        mut self,
        refresh_token: impl Into<String>,
        client_id: impl Into<String>,
        login_url: impl Into<String>,
    ) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self.client_id = Some(client_id.into());
        self.login_url = Some(login_url.into());
        self
    }

    /// The credential pair these settings describe.
    pub fn credentials(&self) -> RestCredentials {
        RestCredentials::from_instance(&self.instance_url, &self.api_version, &self.access_token)
    }
}

/// Credentials shared by all calls of one client.
///
/// Readers always go through [`CredentialCache::get`]; nobody keeps a copy
/// across calls. Refreshes are serialized on an async mutex and a refresh is
/// skipped when another caller already replaced the stale token.
#[derive(Default)]
pub struct CredentialCache {
    current: RwLock<Option<RestCredentials>>,
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCache")
            .field("current", &self.get())
            .finish_non_exhaustive()
    }
}

impl CredentialCache {
    /// Create a cache, optionally pre-filled.
    pub fn new(initial: Option<RestCredentials>) -> Self {
        Self {
            current: RwLock::new(initial.filter(RestCredentials::is_valid)),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The current credentials, if any.
    pub fn get(&self) -> Option<RestCredentials> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the cached credentials.
    pub fn set(&self, credentials: RestCredentials) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credentials);
    }

    /// Obtain credentials through `fetch` unless usable ones are already cached.
    ///
    /// With `stale = None` any cached pair is reused. With `stale = Some(token)`
    /// the cached pair is reused only if its token differs from `token`, which
    /// means a concurrent caller has refreshed in the meantime.
    pub async fn refresh<F, Fut>(&self, stale: Option<&str>, fetch: F) -> Result<RestCredentials>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RestCredentials>>,
    {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.get() {
            if stale.is_none_or(|token| current.token != token) {
                debug!("credentials already refreshed by another call");
                return Ok(current);
            }
        }

        let fresh = fetch().await?;
        if !fresh.is_valid() {
            return Err(Error::config("authentication produced empty credentials"));
        }
        info!(rest_url = %fresh.rest_url, "credentials refreshed");
        self.set(fresh.clone());
        Ok(fresh)
    }
}
