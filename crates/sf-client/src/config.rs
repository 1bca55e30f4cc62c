//! Client configuration.

use std::time::Duration;

/// Which transport the client should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Canvas host bridge.
    Canvas,
    /// REST proxy object.
    Rest,
    /// Canvas when its context is present at construction, otherwise REST.
    #[default]
    Auto,
}

/// How operation failures reach the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// Failures are returned as `Err(SfError)`.
    #[default]
    Throw,
    /// Failures are returned as `Ok(ResponseEnvelope { ok: false, .. })`.
    Return,
}

/// Parameters of the lazy authentication flow used in REST mode.
#[derive(Debug, Clone)]
pub struct AutoAuthConfig {
    /// User id handed to the auth flow; falls back to the context provider.
    pub user_id: Option<String>,
    /// Source id handed to the auth flow; falls back to the context provider.
    pub source_id: Option<String>,
    /// Ask the auth flow to complete without prompting.
    pub immediate: bool,
    /// Delay between credential checks while waiting for the flow.
    pub poll_interval: Duration,
    /// Give up waiting for credentials after this long.
    pub timeout: Duration,
}

impl Default for AutoAuthConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            source_id: None,
            immediate: true,
            poll_interval: Duration::from_millis(250),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Configuration for the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Transport selection.
    pub mode: Mode,
    /// API version override, `"61.0"` or `"v61.0"`.
    pub api_version: Option<String>,
    /// Failure propagation.
    pub error_mode: ErrorMode,
    /// Lazy authentication parameters (REST mode).
    pub auto_auth: AutoAuthConfig,
    /// Optional client-side timeout for each transport call.
    pub call_timeout: Option<Duration>,
    /// Request timeout for the reqwest-backed primitives.
    pub http_timeout: Duration,
    /// User-Agent header value for the reqwest-backed primitives.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Auto,
            api_version: None,
            error_mode: ErrorMode::Throw,
            auto_auth: AutoAuthConfig::default(),
            call_timeout: None,
            http_timeout: Duration::from_secs(30),
            user_agent: crate::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new client config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the transport mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Override the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = Some(version.into());
        self
    }

    /// Set the error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.config.error_mode = mode;
        self
    }

    /// Set the user and source ids for the auth flow.
    pub fn with_auth_ids(
        mut self,
        user_id: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        self.config.auto_auth.user_id = Some(user_id.into());
        self.config.auto_auth.source_id = Some(source_id.into());
        self
    }

    /// Whether the auth flow should run without prompting.
    pub fn with_immediate_auth(mut self, immediate: bool) -> Self {
        self.config.auto_auth.immediate = immediate;
        self
    }

    /// Set the credential polling interval.
    pub fn with_auth_poll_interval(mut self, interval: Duration) -> Self {
        self.config.auto_auth.poll_interval = interval;
        self
    }

    /// Set the auth timeout.
    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.config.auto_auth.timeout = timeout;
        self
    }

    /// Race every transport call against this timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = Some(timeout);
        self
    }

    /// Set the reqwest request timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    /// Set the User-Agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.mode, Mode::Auto);
        assert_eq!(config.error_mode, ErrorMode::Throw);
        assert!(config.api_version.is_none());
        assert!(config.call_timeout.is_none());
        assert!(config.auto_auth.immediate);
        assert_eq!(config.auto_auth.poll_interval, Duration::from_millis(250));
        assert_eq!(config.auto_auth.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder()
            .with_mode(Mode::Rest)
            .with_api_version("60.0")
            .with_error_mode(ErrorMode::Return)
            .with_auth_ids("005xx", "src-1")
            .with_immediate_auth(false)
            .with_auth_poll_interval(Duration::from_millis(10))
            .with_auth_timeout(Duration::from_secs(2))
            .with_call_timeout(Duration::from_secs(5))
            .with_user_agent("custom/1.0")
            .build();

        assert_eq!(config.mode, Mode::Rest);
        assert_eq!(config.api_version.as_deref(), Some("60.0"));
        assert_eq!(config.error_mode, ErrorMode::Return);
        assert_eq!(config.auto_auth.user_id.as_deref(), Some("005xx"));
        assert_eq!(config.auto_auth.source_id.as_deref(), Some("src-1"));
        assert!(!config.auto_auth.immediate);
        assert_eq!(config.call_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.user_agent, "custom/1.0");
    }
}
