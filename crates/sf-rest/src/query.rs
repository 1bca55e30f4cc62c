//! SOQL query types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options of a `query` call.
///
/// A bare SOQL string converts into a request that follows every page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub soql: String,
    /// Follow `nextRecordsUrl` until the result is complete.
    #[serde(default = "default_page_all")]
    pub page_all: bool,
}

fn default_page_all() -> bool {
    true
}

impl QueryRequest {
    pub fn new(soql: impl Into<String>) -> Self {
        Self {
            soql: soql.into(),
            page_all: true,
        }
    }

    /// Only fetch the first page.
    pub fn first_page(mut self) -> Self {
        self.page_all = false;
        self
    }
}

impl From<&str> for QueryRequest {
    fn from(soql: &str) -> Self {
        Self::new(soql)
    }
}

impl From<String> for QueryRequest {
    fn from(soql: String) -> Self {
        Self::new(soql)
    }
}

/// One page of a SOQL query result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryPage {
    #[serde(default)]
    pub total_size: Option<u64>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub next_records_url: Option<String>,
    #[serde(default)]
    pub records: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_request_from_str() {
        let request: QueryRequest = "SELECT Id FROM Contact".into();
        assert!(request.page_all);
        assert!(!request.clone().first_page().page_all);
    }

    #[test]
    fn test_query_request_deserialize_defaults_page_all() {
        let request: QueryRequest =
            serde_json::from_value(json!({"soql": "SELECT Id FROM Contact"})).unwrap();
        assert!(request.page_all);

        let request: QueryRequest =
            serde_json::from_value(json!({"soql": "SELECT Id FROM Contact", "pageAll": false}))
                .unwrap();
        assert!(!request.page_all);
    }

    #[test]
    fn test_query_page_deserialize() {
        let page: QueryPage = serde_json::from_value(json!({
            "totalSize": 3,
            "done": false,
            "nextRecordsUrl": "/services/data/v61.0/query/01gxx-2000",
            "records": [{"Id": "003A"}, {"Id": "003B"}]
        }))
        .unwrap();
        assert_eq!(page.total_size, Some(3));
        assert_eq!(page.records.len(), 2);
        assert!(page.next_records_url.is_some());
    }
}
