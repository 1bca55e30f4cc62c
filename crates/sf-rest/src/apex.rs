//! Apex REST passthrough.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dualforce_client::{Error, Method, Result};

/// A call to a custom Apex REST endpoint under `/services/apexrest`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApexRequest {
    #[serde(default = "default_method")]
    pub method: Method,
    /// Endpoint path, with or without a leading slash.
    pub path: String,
    #[serde(default)]
    pub params: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<Value>,
}

fn default_method() -> Method {
    Method::Get
}

impl ApexRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.path.trim().trim_matches('/').is_empty() {
            return Err(Error::invalid_request("path is required"));
        }
        if self.method.is_bodiless() && self.body.is_some() {
            return Err(Error::invalid_request(format!(
                "{} requests cannot carry a body",
                self.method
            )));
        }
        Ok(())
    }
}
