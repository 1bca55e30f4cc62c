//! Parsing of the many shapes Salesforce (and proxies in front of it) use to
//! report an error.
//!
//! REST endpoints answer with an array of `{message, errorCode, fields}`,
//! DML results carry `{statusCode, message}`, OAuth endpoints return
//! `{error, error_description}` and proxies frequently hand back the same
//! structures JSON-encoded inside a string. [`parse_backend_error`] folds all of
//! them into one [`BackendError`].

use std::sync::LazyLock;

use regex_lite::Regex;
use serde_json::Value;
use tracing::debug;

/// Fallback message when the backend gave nothing usable.
const UNKNOWN_ERROR: &str = "Unknown error";

static TOKEN_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"00[A-Za-z0-9]{13,}[!][A-Za-z0-9_.]+").ok());

static SESSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"sid=[A-Za-z0-9]{20,}").ok());

static METHOD_NOT_ALLOWED_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)method\b.*\bnot allowed").ok());

static UNAUTHORIZED_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^(401\s+)?unauthori[sz]ed\b").ok());

/// Normalized backend error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// Sanitized, human-readable message. Never empty.
    pub message: String,
    /// Backend error code such as `MALFORMED_QUERY`.
    pub code: Option<String>,
    /// HTTP status embedded in the error body, when the shape carries one.
    pub status: Option<u16>,
    /// Fields the error refers to.
    pub fields: Vec<String>,
}

impl BackendError {
    fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: if message.trim().is_empty() {
                UNKNOWN_ERROR.to_string()
            } else {
                sanitize_error_message(&message)
            },
            code: None,
            status: None,
            fields: Vec::new(),
        }
    }

    /// Returns true for an expired or invalid session.
    ///
    /// The message is only consulted for bare bodies that carry neither an
    /// error code nor a status.
    pub fn is_session_error(&self) -> bool {
        self.code.as_deref() == Some("INVALID_SESSION_ID")
            || self.status == Some(401)
            || (self.is_bare() && matches_pattern(&UNAUTHORIZED_PATTERN, &self.message))
    }

    /// Returns true when the host refused the HTTP verb.
    pub fn is_method_not_allowed(&self) -> bool {
        self.code.as_deref() == Some("METHOD_NOT_ALLOWED")
            || self.status == Some(405)
            || (self.is_bare() && matches_pattern(&METHOD_NOT_ALLOWED_PATTERN, &self.message))
    }

    fn is_bare(&self) -> bool {
        self.code.is_none() && self.status.is_none()
    }
}

fn matches_pattern(pattern: &LazyLock<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

/// Parse any backend error payload into a [`BackendError`].
///
/// Arrays report their first element. Strings that contain JSON are decoded
/// and parsed again. The returned message is never empty.
pub fn parse_backend_error(payload: &Value) -> BackendError {
    match payload {
        Value::Null => BackendError::from_message(UNKNOWN_ERROR),
        Value::Array(items) => match items.first() {
            Some(first) => parse_backend_error(first),
            None => BackendError::from_message(UNKNOWN_ERROR),
        },
        Value::Object(map) => {
            let text = |key: &str| {
                map.get(key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };

            // OAuth: {error, error_description}
            let oauth_description = text("error_description");
            let message = text("message")
                .or_else(|| oauth_description.clone())
                .or_else(|| text("errorMessage"))
                .or_else(|| text("error"))
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());

            let code = text("errorCode")
                .or_else(|| text("statusCode"))
                .or_else(|| oauth_description.as_ref().and_then(|_| text("error")));

            let status = map
                .get("statusCode")
                .or_else(|| map.get("status"))
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok());

            let fields = map
                .get("fields")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            let mut parsed = BackendError::from_message(message);
            parsed.code = code;
            parsed.status = status;
            parsed.fields = fields;
            parsed
        }
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.starts_with('[') || trimmed.starts_with('{') {
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(inner) => return parse_backend_error(&inner),
                    Err(e) => debug!(error = %e, "error text looks like JSON but does not parse"),
                }
            }
            BackendError::from_message(trimmed)
        }
        other => {
            debug!(payload = %other, "unexpected error payload shape");
            BackendError::from_message(other.to_string())
        }
    }
}

/// Sanitize an error message to prevent exposing sensitive data.
///
/// This function:
/// - Removes potential tokens (anything that looks like an access token)
/// - Removes potential session IDs
/// - Truncates messages longer than 500 characters
pub fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = message.to_string();

    // Salesforce tokens start with the 15-char org id followed by '!'
    if let Some(re) = TOKEN_PATTERN.as_ref() {
        sanitized = re.replace_all(&sanitized, "[REDACTED_TOKEN]").to_string();
    }

    if let Some(re) = SESSION_PATTERN.as_ref() {
        sanitized = re.replace_all(&sanitized, "sid=[REDACTED]").to_string();
    }

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
