//! Tests against a real org. Ignored unless run with `--ignored`.

use dualforce::rest::{CreateRequest, DeleteRequest, RetrieveRequest};
use dualforce::{ClientConfig, Mode, RestSettings, SalesforceClient};
use serde_json::json;

use crate::common::init_tracing;

fn live_client() -> SalesforceClient {
    init_tracing();
    let settings = RestSettings::from_env()
        .unwrap_or_else(|e| panic!("live tests need SF_INSTANCE_URL and SF_ACCESS_TOKEN: {e}"));
    SalesforceClient::builder()
        .with_config(ClientConfig::builder().with_mode(Mode::Rest).build())
        .with_rest_settings(settings)
        .build()
        .unwrap()
}

#[tokio::test]
#[ignore]
async fn live_query_organization() {
    let client = live_client();
    let result = client.query("SELECT Id, Name FROM Organization").await.unwrap();
    assert!(result.ok);
    assert_eq!(result.records().len(), 1);
}

#[tokio::test]
#[ignore]
async fn live_account_lifecycle() {
    let client = live_client();
    let name = format!("dualforce {}", chrono::Utc::now().timestamp_millis());

    let created = client
        .create(CreateRequest::new("Account", json!({"Name": name})))
        .await
        .unwrap();
    let id = created.data["id"].as_str().unwrap().to_string();

    let soql = format!(
        "SELECT Id FROM Account WHERE Name = {}",
        SalesforceClient::escape_soql(&name)
    );
    let found = client.query(soql).await.unwrap();
    assert_eq!(found.records().len(), 1);

    let fetched = client
        .retrieve(RetrieveRequest::new("Account", &id).fields(["Id", "Name"]))
        .await
        .unwrap();
    assert_eq!(fetched.data["Name"], name.as_str());

    client.delete(DeleteRequest::new("Account", &id)).await.unwrap();
}
