//! Composite API request types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dualforce_client::{Endpoints, Error, Method, Result};

use crate::sobject::require_sobject;

/// Subrequests allowed in one composite call.
pub const MAX_COMPOSITE_SUBREQUESTS: usize = 25;

/// Records allowed in one composite tree call.
pub const MAX_TREE_RECORDS: usize = 200;

/// A composite call bundling several subrequests.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub requests: Vec<BatchSubrequest>,
    #[serde(default)]
    pub all_or_none: bool,
    #[serde(default)]
    pub collate_subrequests: bool,
}

impl BatchRequest {
    pub fn new(requests: Vec<BatchSubrequest>) -> Self {
        Self {
            requests,
            all_or_none: false,
            collate_subrequests: false,
        }
    }

    pub fn all_or_none(mut self, all_or_none: bool) -> Self {
        self.all_or_none = all_or_none;
        self
    }

    pub fn collate_subrequests(mut self, collate: bool) -> Self {
        self.collate_subrequests = collate;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.requests.is_empty() {
            return Err(Error::invalid_request("requests must not be empty"));
        }
        if self.requests.len() > MAX_COMPOSITE_SUBREQUESTS {
            return Err(Error::invalid_request(format!(
                "a composite call takes at most {MAX_COMPOSITE_SUBREQUESTS} requests, got {}",
                self.requests.len()
            )));
        }
        for (i, request) in self.requests.iter().enumerate() {
            if request.url.trim().is_empty() {
                return Err(Error::invalid_request(format!("requests[{i}].url is required")));
            }
        }
        Ok(())
    }

    /// Wire body with normalized URLs and a reference id on every subrequest.
    pub(crate) fn to_composite(&self, endpoints: &Endpoints) -> Result<CompositeRequest> {
        let mut seen = HashSet::new();
        let mut subrequests = Vec::with_capacity(self.requests.len());

        for (i, request) in self.requests.iter().enumerate() {
            let reference_id = request
                .reference_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("ref{i}"));
            if !seen.insert(reference_id.clone()) {
                return Err(Error::invalid_request(format!(
                    "duplicate referenceId '{reference_id}'"
                )));
            }

            subrequests.push(CompositeSubrequest {
                method: request.method,
                url: normalize_subrequest_url(&request.url, endpoints),
                reference_id,
                body: request.body.clone(),
            });
        }

        Ok(CompositeRequest {
            all_or_none: self.all_or_none,
            collate_subrequests: self.collate_subrequests,
            subrequests,
        })
    }
}

/// One subrequest of a [`BatchRequest`].
///
/// `url` may be bare (`sobjects/Contact/001`), root-relative
/// (`/sobjects/Contact/001`), version-prefixed or absolute.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubrequest {
    pub method: Method,
    pub url: String,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
}

impl BatchSubrequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            reference_id: None,
            body: None,
        }
    }

    pub fn reference_id(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Composite request body.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CompositeRequest {
    #[serde(rename = "allOrNone")]
    pub all_or_none: bool,
    #[serde(rename = "collateSubrequests")]
    pub collate_subrequests: bool,
    #[serde(rename = "compositeRequest")]
    pub subrequests: Vec<CompositeSubrequest>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CompositeSubrequest {
    pub method: Method,
    pub url: String,
    #[serde(rename = "referenceId")]
    pub reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Rewrite a subrequest URL as `/services/data/{version}/{rest}`.
///
/// Any origin, `/services/data/` prefix and version segment the caller
/// supplied are dropped; the client's own version is always used.
pub fn normalize_subrequest_url(url: &str, endpoints: &Endpoints) -> String {
    let mut path = url.trim().to_string();

    if let Ok(parsed) = url::Url::parse(&path) {
        if parsed.has_host() {
            path = match parsed.query() {
                Some(query) => format!("{}?{}", parsed.path(), query),
                None => parsed.path().to_string(),
            };
        }
    }

    let mut rest = path.trim_start_matches('/');
    if let Some(stripped) = rest.strip_prefix("services/data/") {
        rest = stripped;
    }
    rest = strip_version(rest);

    format!("{}/{}", endpoints.data_path(), rest.trim_start_matches('/'))
}

/// Drop a leading `vNN.N` segment.
fn strip_version(path: &str) -> &str {
    let (segment, remainder) = match path.find(['/', '?']) {
        Some(idx) => path.split_at(idx),
        None => (path, ""),
    };
    let is_version = segment
        .strip_prefix(['v', 'V'])
        .and_then(|digits| digits.split_once('.'))
        .is_some_and(|(major, minor)| {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        });
    if is_version {
        remainder
    } else {
        path
    }
}

/// Insert records, and their nested children, through composite tree calls.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTreeRequest {
    pub sobject: String,
    pub records: Vec<Value>,
    /// Records per call; clamped to `1..=200`.
    #[serde(default)]
    pub chunk_size: Option<usize>,
}

impl CreateTreeRequest {
    pub fn new(sobject: impl Into<String>, records: Vec<Value>) -> Self {
        Self {
            sobject: sobject.into(),
            records,
            chunk_size: None,
        }
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_sobject(&self.sobject)?;
        if self.records.is_empty() {
            return Err(Error::invalid_request("records must not be empty"));
        }
        if let Some(i) = self.records.iter().position(|record| !record.is_object()) {
            return Err(Error::invalid_request(format!("records[{i}] must be a JSON object")));
        }
        Ok(())
    }

    pub(crate) fn effective_chunk_size(&self) -> usize {
        self.chunk_size
            .unwrap_or(MAX_TREE_RECORDS)
            .clamp(1, MAX_TREE_RECORDS)
    }

    /// Request bodies, one per chunk, with `attributes` filled in.
    pub(crate) fn chunk_bodies(&self) -> Vec<Value> {
        let records: Vec<Value> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| with_attributes(record, &self.sobject, i + 1))
            .collect();

        records
            .chunks(self.effective_chunk_size())
            .map(|chunk| {
                let mut body = serde_json::Map::new();
                body.insert("records".to_string(), Value::Array(chunk.to_vec()));
                Value::Object(body)
            })
            .collect()
    }
}

/// Set `attributes.type` and `attributes.referenceId` unless already given.
fn with_attributes(record: &Value, sobject: &str, index: usize) -> Value {
    let mut record = record.clone();
    if let Value::Object(map) = &mut record {
        let attributes = map
            .entry("attributes")
            .or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(attributes) = attributes {
            attributes
                .entry("type")
                .or_insert_with(|| Value::String(sobject.to_string()));
            attributes
                .entry("referenceId")
                .or_insert_with(|| Value::String(format!("ref{index}")));
        }
    }
    record
}
