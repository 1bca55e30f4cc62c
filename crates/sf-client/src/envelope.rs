//! The uniform result of every client operation.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::request::{Method, Transport};

/// Outcome of one successful transport call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    /// Always true; failures are reported as [`Error`].
    pub ok: bool,
    pub status: u16,
    /// Body as received; `Value::Null` for empty responses (e.g. 204).
    pub payload: Value,
    pub method: Method,
    pub url: String,
    pub transport: Transport,
}

impl CallResult {
    /// A successful call.
    pub fn success(
        status: u16,
        payload: Value,
        method: Method,
        url: impl Into<String>,
        transport: Transport,
    ) -> Self {
        Self {
            ok: true,
            status,
            payload,
            method,
            url: url.into(),
            transport,
        }
    }
}

/// Error details carried by a failed envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub message: String,
    pub code: Option<String>,
}

impl From<&Error> for ApiError {
    fn from(err: &Error) -> Self {
        Self {
            message: err.message(),
            code: err.code.clone(),
        }
    }
}

/// Pagination and query metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub total_size: Option<u64>,
    pub done: bool,
    /// Number of records gathered across all fetched pages.
    pub page_count: usize,
    /// Number of pages fetched.
    pub pages: u32,
    pub next_records_url: Option<String>,
    pub soql: Option<String>,
}

/// Normalized response of every public operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub ok: bool,
    /// HTTP status, or 0 if no response was received.
    pub status: u16,
    /// Operation-specific mapped payload.
    pub data: Value,
    /// Untouched payload as received from the backend.
    pub raw: Value,
    pub error: Option<ApiError>,
    pub method: Method,
    pub url: String,
    pub source: Transport,
    pub meta: Option<Meta>,
}

impl ResponseEnvelope {
    /// Envelope for a successful call whose data is the payload itself.
    pub fn from_call(call: CallResult) -> Self {
        let raw = call.payload;
        Self {
            ok: call.ok,
            status: call.status,
            data: raw.clone(),
            raw,
            error: None,
            method: call.method,
            url: call.url,
            source: call.transport,
            meta: None,
        }
    }

    /// Envelope describing a failed call.
    pub fn from_error(err: &Error, method: Method, url: &str, source: Transport) -> Self {
        Self {
            ok: false,
            status: err.http_status,
            data: Value::Null,
            raw: err.payload.clone().unwrap_or(Value::Null),
            error: Some(ApiError::from(err)),
            method: err.method.unwrap_or(method),
            url: err.url.clone().unwrap_or_else(|| url.to_string()),
            source: err.transport.unwrap_or(source),
            meta: None,
        }
    }

    /// Replace the mapped data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Attach metadata.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Deserialize `data` into a caller type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone()).map_err(Into::into)
    }

    /// Records of a query envelope; empty for any other shape.
    pub fn records(&self) -> &[Value] {
        self.data.as_array().map(Vec::as_slice).unwrap_or_default()
    }

    /// Interpret the envelope of an upsert call.
    ///
    /// Salesforce answers an update with an empty body and an insert with
    /// `{id, created: true}`.
    pub fn upsert_outcome(&self) -> UpsertOutcome {
        match self.data.get("id").and_then(Value::as_str) {
            Some(id) if self.data.get("created").and_then(Value::as_bool) != Some(false) => {
                UpsertOutcome::Created { id: id.to_string() }
            }
            _ => UpsertOutcome::Updated,
        }
    }
}

/// Which path an upsert took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// An existing record matched the external id.
    Updated,
    /// A new record was inserted.
    Created { id: String },
}
