//! Single-record operation requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dualforce_client::security::soql;
use dualforce_client::{Error, Result};

/// GET a record by id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveRequest {
    pub sobject: String,
    pub id: String,
    /// Restrict the returned fields; all fields when empty.
    #[serde(default)]
    pub fields: Vec<String>,
}

impl RetrieveRequest {
    pub fn new(sobject: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            sobject: sobject.into(),
            id: id.into(),
            fields: Vec::new(),
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_sobject(&self.sobject)?;
        require_id(&self.id)?;
        for field in &self.fields {
            if !field.split('.').all(soql::is_safe_field_name) {
                return Err(Error::invalid_request(format!("invalid field name '{field}'")));
            }
        }
        Ok(())
    }
}

/// POST a new record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub sobject: String,
    pub record: Value,
}

impl CreateRequest {
    pub fn new(sobject: impl Into<String>, record: Value) -> Self {
        Self {
            sobject: sobject.into(),
            record,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_sobject(&self.sobject)?;
        require_record(&self.record)
    }
}

/// PATCH an existing record by id.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub sobject: String,
    pub id: String,
    pub record: Value,
}

impl UpdateRequest {
    pub fn new(sobject: impl Into<String>, id: impl Into<String>, record: Value) -> Self {
        Self {
            sobject: sobject.into(),
            id: id.into(),
            record,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_sobject(&self.sobject)?;
        require_id(&self.id)?;
        require_record(&self.record)
    }
}

/// PATCH a record addressed by an external id.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRequest {
    pub sobject: String,
    pub external_id_field: String,
    pub external_id_value: String,
    pub record: Value,
}

impl UpsertRequest {
    pub fn new(
        sobject: impl Into<String>,
        external_id_field: impl Into<String>,
        external_id_value: impl Into<String>,
        record: Value,
    ) -> Self {
        Self {
            sobject: sobject.into(),
            external_id_field: external_id_field.into(),
            external_id_value: external_id_value.into(),
            record,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_sobject(&self.sobject)?;
        if !soql::is_safe_field_name(&self.external_id_field) {
            return Err(Error::invalid_request(format!(
                "invalid external id field '{}'",
                self.external_id_field
            )));
        }
        if self.external_id_value.trim().is_empty() {
            return Err(Error::invalid_request("externalIdValue is required"));
        }
        require_record(&self.record)
    }
}

/// DELETE a record by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub sobject: String,
    pub id: String,
}

impl DeleteRequest {
    pub fn new(sobject: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            sobject: sobject.into(),
            id: id.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_sobject(&self.sobject)?;
        require_id(&self.id)
    }
}

pub(crate) fn require_sobject(sobject: &str) -> Result<()> {
    if sobject.trim().is_empty() {
        return Err(Error::invalid_request("sobject is required"));
    }
    if !soql::is_safe_sobject_name(sobject) {
        return Err(Error::invalid_request(format!("invalid SObject name '{sobject}'")));
    }
    Ok(())
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::invalid_request("id is required"));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::invalid_request(format!("invalid record id '{id}'")));
    }
    Ok(())
}

fn require_record(record: &Value) -> Result<()> {
    if record.is_object() {
        Ok(())
    } else {
        Err(Error::invalid_request("record must be a JSON object"))
    }
}
