//! Base URLs for every Salesforce resource the client touches.
//!
//! All operation URLs are built from an [`Endpoints`] value; nothing else in
//! the workspace concatenates `/services/...` paths by hand.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::{Error, Result};
use crate::DEFAULT_API_VERSION;

static VERSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/v(\d+\.\d+)").ok());

/// Derived, read-only endpoint record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Origin, e.g. `https://na1.salesforce.com`.
    pub base: String,
    /// Version segment, e.g. `v61.0`.
    pub version: String,
    /// `{base}/services/data/{version}`.
    pub data_base: String,
    /// `{data_base}/query`.
    pub query_url: String,
    /// `{base}/services/apexrest`.
    pub apex_base: String,
}

impl Endpoints {
    /// Build endpoints from an origin and a version (`"61.0"` or `"v61.0"`).
    pub fn new(base: &str, version: &str) -> Result<Self> {
        let base = origin(base)?;
        let version = normalize_version(version)?;
        let data_base = format!("{base}/services/data/{version}");
        Ok(Self {
            query_url: format!("{data_base}/query"),
            apex_base: format!("{base}/services/apexrest"),
            data_base,
            version,
            base,
        })
    }

    /// Derive endpoints from a REST base URL such as
    /// `https://na1.salesforce.com/services/data/v61.0/`.
    ///
    /// The version embedded in the URL wins unless `version_override` is set;
    /// without either, [`DEFAULT_API_VERSION`] is used.
    pub fn from_rest_url(rest_url: &str, version_override: Option<&str>) -> Result<Self> {
        let version = version_override
            .map(str::to_string)
            .or_else(|| embedded_version(rest_url))
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        Self::new(rest_url, &version)
    }

    /// Derive endpoints from a Canvas context: the client's instance URL and
    /// the context's REST link (`/services/data/v61.0/`), if any.
    pub fn from_canvas(
        instance_url: &str,
        rest_link: Option<&str>,
        version_override: Option<&str>,
    ) -> Result<Self> {
        let version = version_override
            .map(str::to_string)
            .or_else(|| rest_link.and_then(embedded_version))
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        Self::new(instance_url, &version)
    }

    /// Absolute URL for a resource under the versioned data path.
    ///
    /// Example: `data_url("sobjects/Account")` ->
    /// `https://na1.salesforce.com/services/data/v61.0/sobjects/Account`
    pub fn data_url(&self, path: &str) -> String {
        format!("{}/{}", self.data_base, path.trim_start_matches('/'))
    }

    /// Absolute URL for a root-relative path returned by the backend, such as
    /// a query's `nextRecordsUrl`. Absolute URLs pass through unchanged.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base, path.trim_start_matches('/'))
        }
    }

    /// Absolute URL for an Apex REST path; exactly one slash joins the two.
    pub fn apex_url(&self, path: &str) -> String {
        format!("{}/{}", self.apex_base, path.trim_start_matches('/'))
    }

    /// Root-relative versioned data path, e.g. `/services/data/v61.0`.
    pub fn data_path(&self) -> String {
        format!("/services/data/{}", self.version)
    }
}

fn origin(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url.trim())?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return Err(Error::config(format!("URL has no usable origin: {url}")));
    }
    Ok(origin.ascii_serialization())
}

fn embedded_version(url: &str) -> Option<String> {
    VERSION_PATTERN
        .as_ref()?
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("v{}", m.as_str()))
}

fn normalize_version(version: &str) -> Result<String> {
    let trimmed = version.trim().trim_start_matches(['v', 'V']);
    let valid = trimmed
        .split_once('.')
        .is_some_and(|(major, minor)| {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        });
    if !valid {
        return Err(Error::config(format!("invalid API version '{version}'")));
    }
    Ok(format!("v{trimmed}"))
}
