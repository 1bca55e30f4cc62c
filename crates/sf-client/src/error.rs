//! Error types shared by every dualforce crate.
//!
//! Every failure that leaves the client carries the same shape: a classified
//! [`ErrorKind`], the HTTP status (0 when no response arrived), the backend
//! error code, the raw backend payload and the call it belongs to.

use std::time::Duration;

use crate::backend_error::BackendError;
use crate::request::{Method, Transport};

/// Result type alias for dualforce operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Alias matching the name callers of the Salesforce API usually reach for.
pub type SfError = Error;

/// Error type for dualforce operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// HTTP status of the failed call, or 0 if no response was received.
    pub http_status: u16,
    /// Backend-specific error code, e.g. `INVALID_SESSION_ID`.
    pub code: Option<String>,
    /// Raw backend error body.
    pub payload: Option<serde_json::Value>,
    /// Method of the failed call.
    pub method: Option<Method>,
    /// URL of the failed call.
    pub url: Option<String>,
    /// Transport that served the failed call.
    pub transport: Option<Transport>,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            http_status: 0,
            code: None,
            payload: None,
            method: None,
            url: None,
            transport: None,
            source: None,
        }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        let mut err = Self::new(kind);
        err.source = Some(Box::new(source));
        err
    }

    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config(message.into()))
    }

    /// Shorthand for a request that failed validation before any call was made.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest(message.into()))
    }

    /// Build an error from a non-success backend response.
    ///
    /// The kind is chosen from the status and the parsed backend error: 401 or
    /// `INVALID_SESSION_ID` is an authentication error, 405 or a
    /// "method not allowed" message is a verb restriction, a body carrying an
    /// error code is an API error, no response at all is a connection error
    /// and anything else is a plain HTTP error.
    pub fn from_backend(status: u16, parsed: BackendError, payload: serde_json::Value) -> Self {
        let kind = if parsed.is_session_error() || status == 401 {
            ErrorKind::Authentication(parsed.message.clone())
        } else if status == 405 || parsed.is_method_not_allowed() {
            ErrorKind::MethodNotAllowed(parsed.message.clone())
        } else if parsed.code.is_some() {
            ErrorKind::Api(parsed.message.clone())
        } else if status == 0 {
            ErrorKind::Connection(parsed.message.clone())
        } else {
            ErrorKind::Http {
                status,
                message: parsed.message.clone(),
            }
        };

        let mut err = Self::new(kind);
        err.http_status = status;
        err.code = parsed.code;
        if !payload.is_null() {
            err.payload = Some(payload);
        }
        err
    }

    /// Attach the call this error belongs to.
    pub fn for_call(
        mut self,
        method: Method,
        url: impl Into<String>,
        transport: Transport,
    ) -> Self {
        self.method = Some(method);
        self.url = Some(url.into());
        self.transport = Some(transport);
        self
    }

    /// Human-readable message without the kind prefix.
    pub fn message(&self) -> String {
        self.kind.message()
    }

    /// Returns true for configuration and validation errors.
    ///
    /// These are raised before any network call and are never converted into
    /// a failed envelope, whatever the error mode.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Config(_) | ErrorKind::InvalidRequest(_) | ErrorKind::AuthTimeout(_)
        )
    }

    /// Returns true if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }

    /// Returns true if the host rejected the HTTP verb.
    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self.kind, ErrorKind::MethodNotAllowed(_))
    }

    /// Returns true for 4xx responses.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status)
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Missing or inconsistent client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation input failed validation; no call was made.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Credentials did not materialize within the auto-auth timeout.
    #[error("Authentication timed out after {0:?}")]
    AuthTimeout(Duration),

    /// Expired or invalid session (HTTP 401 / `INVALID_SESSION_ID`).
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Host rejected the HTTP verb (HTTP 405).
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Structured application error from the backend.
    #[error("Salesforce API error: {0}")]
    Api(String),

    /// Non-success response without a structured body.
    #[error("HTTP error: {status} {message}")]
    Http { status: u16, message: String },

    /// No response reached the client.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Client-side call timeout elapsed.
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl ErrorKind {
    /// The message carried by this kind, without its display prefix.
    pub fn message(&self) -> String {
        match self {
            ErrorKind::Config(m)
            | ErrorKind::InvalidRequest(m)
            | ErrorKind::Authentication(m)
            | ErrorKind::MethodNotAllowed(m)
            | ErrorKind::Api(m)
            | ErrorKind::Connection(m)
            | ErrorKind::Json(m) => m.clone(),
            ErrorKind::Http { message, .. } => message.clone(),
            ErrorKind::AuthTimeout(_) | ErrorKind::Timeout(_) => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
        let kind = if let Some(status) = err.status() {
            ErrorKind::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ErrorKind::Connection(err.to_string())
        };

        let mut err = Error::with_source(kind, err);
        err.http_status = status;
        err
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Config(format!("Invalid URL: {}", err)), err)
    }
}
