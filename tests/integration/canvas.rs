use std::collections::HashMap;
use std::sync::Mutex;

use dualforce::client::UpsertOutcome;
use dualforce::rest::{
    CreateRequest, DeleteRequest, RetrieveRequest, UpdateRequest, UpsertRequest,
};
use dualforce::transport::BridgeResponse;
use dualforce::{ErrorMode, Method, Transport};
use serde_json::{json, Value};

use crate::common::{canvas_client, session_expired, ScriptedBridge, INSTANCE_URL};

fn ok(status: u16, payload: Value) -> crate::common::BridgeResult {
    Ok(BridgeResponse::new(status, payload))
}

fn fail(status: u16, payload: Value) -> crate::common::BridgeResult {
    Err(BridgeResponse::new(status, payload))
}

#[tokio::test]
async fn test_canvas_record_lifecycle_with_verb_override() {
    let records: Mutex<HashMap<String, Value>> = Mutex::new(HashMap::new());
    let bridge = ScriptedBridge::new(move |url, call| {
        let mut records = records.lock().unwrap();
        let id = url
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .split('?')
            .next()
            .unwrap_or_default();
        match call.method {
            Method::Post if url.ends_with("/sobjects/Contact") => {
                let body: Value =
                    serde_json::from_str(call.data.as_deref().unwrap_or("{}")).unwrap();
                records.insert("003A".into(), body);
                ok(201, json!({"id": "003A", "success": true, "errors": []}))
            }
            Method::Get => match records.get(id) {
                Some(record) => ok(200, record.clone()),
                None => fail(404, json!([{"message": "not found", "errorCode": "NOT_FOUND"}])),
            },
            // The host refuses PATCH; only the POST override gets through
            Method::Patch => fail(
                405,
                json!([{"message": "Method Not Allowed", "errorCode": "METHOD_NOT_ALLOWED"}]),
            ),
            Method::Post => {
                let body: Value =
                    serde_json::from_str(call.data.as_deref().unwrap_or("{}")).unwrap();
                if let (Some(Value::Object(record)), Value::Object(changes)) =
                    (records.get_mut("003A"), body)
                {
                    record.extend(changes);
                }
                ok(204, Value::Null)
            }
            Method::Delete => {
                records.remove(id);
                ok(204, Value::Null)
            }
            Method::Put => fail(405, Value::Null),
        }
    });
    let client = canvas_client(bridge.clone(), ErrorMode::Throw);

    let created = client
        .create(CreateRequest::new("Contact", json!({"LastName": "Lovelace"})))
        .await
        .unwrap();
    assert_eq!(created.status, 201);
    let id = created.data["id"].as_str().unwrap().to_string();

    let updated = client
        .update(UpdateRequest::new("Contact", &id, json!({"Title": "Countess"})))
        .await
        .unwrap();
    assert!(updated.ok);
    // The envelope reports the verb the caller asked for
    assert_eq!(updated.method, Method::Patch);

    let fetched = client.retrieve(RetrieveRequest::new("Contact", &id)).await.unwrap();
    assert_eq!(fetched.data, json!({"LastName": "Lovelace", "Title": "Countess"}));

    client.delete(DeleteRequest::new("Contact", &id)).await.unwrap();
    let err = client.retrieve(RetrieveRequest::new("Contact", &id)).await.unwrap_err();
    assert_eq!(err.http_status, 404);

    let calls = bridge.calls();
    let (override_url, override_call) = &calls[2];
    assert_eq!(override_call.method, Method::Post);
    assert!(override_url.ends_with("/sobjects/Contact/003A?_HttpMethod=PATCH"));
    assert!(override_call
        .headers
        .contains(&("X-HTTP-Method-Override".to_string(), "PATCH".to_string())));
}

#[tokio::test]
async fn test_canvas_session_refresh_retries_once() {
    let bridge = ScriptedBridge::new(|_, call| {
        if call.client.oauth_token == "canvas-token-0" {
            fail(401, session_expired())
        } else {
            ok(200, json!({"Id": "003A"}))
        }
    });
    let client = canvas_client(bridge.clone(), ErrorMode::Throw);

    let result = client.retrieve(RetrieveRequest::new("Contact", "003A")).await.unwrap();
    assert!(result.ok);
    assert_eq!(bridge.refreshes(), 1);
    assert_eq!(bridge.calls().len(), 2);
}

#[tokio::test]
async fn test_canvas_persistent_auth_failure_in_both_modes() {
    let bridge = ScriptedBridge::new(|_, _| fail(401, session_expired()));

    let err = canvas_client(bridge.clone(), ErrorMode::Throw)
        .retrieve(RetrieveRequest::new("Contact", "003A"))
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
    assert_eq!(err.code.as_deref(), Some("INVALID_SESSION_ID"));
    assert_eq!(bridge.calls().len(), 2);

    let result = canvas_client(bridge, ErrorMode::Return)
        .retrieve(RetrieveRequest::new("Contact", "003A"))
        .await
        .unwrap();
    assert!(!result.ok);
    assert_eq!(result.status, 401);
    assert_eq!(result.source, Transport::Canvas);
    assert_eq!(
        result.url,
        format!("{INSTANCE_URL}/services/data/v61.0/sobjects/Contact/003A")
    );
}

#[tokio::test]
async fn test_canvas_post_refusal_is_not_overridden() {
    let bridge = ScriptedBridge::new(|_, _| fail(405, json!([{"message": "Method Not Allowed"}])));

    let err = canvas_client(bridge.clone(), ErrorMode::Throw)
        .create(CreateRequest::new("Contact", json!({"LastName": "Lovelace"})))
        .await
        .unwrap_err();
    assert!(err.is_method_not_allowed());
    assert_eq!(bridge.calls().len(), 1);
}

#[tokio::test]
async fn test_canvas_query_pagination() {
    let bridge = ScriptedBridge::new(|url, _| {
        if url.ends_with("/query/01g-2000") {
            ok(200, json!({"totalSize": 3, "done": true, "records": [{"Id": "003C"}]}))
        } else {
            ok(200, json!({
                "totalSize": 3,
                "done": false,
                "nextRecordsUrl": "/services/data/v61.0/query/01g-2000",
                "records": [{"Id": "003A"}, {"Id": "003B"}]
            }))
        }
    });
    let client = canvas_client(bridge.clone(), ErrorMode::Throw);

    let result = client.query("SELECT Id FROM Contact").await.unwrap();
    assert_eq!(result.records().len(), 3);
    let meta = result.meta.unwrap();
    assert_eq!(meta.page_count, 3);
    assert_eq!(meta.pages, 2);

    let calls = bridge.calls();
    assert!(calls[0].0.starts_with(&format!("{INSTANCE_URL}/services/data/v61.0/query?q=")));
    assert_eq!(calls[1].0, format!("{INSTANCE_URL}/services/data/v61.0/query/01g-2000"));
}

#[tokio::test]
async fn test_canvas_unreachable_host() {
    let bridge = ScriptedBridge::new(|_, _| fail(0, Value::Null));

    let client = canvas_client(bridge, ErrorMode::Return);
    let result = client.retrieve(RetrieveRequest::new("Contact", "003A")).await.unwrap();
    assert!(!result.ok);
    assert_eq!(result.status, 0);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_canvas_upsert_twice_updates_one_record() {
    // External id -> record, as the org would hold them
    let records: Mutex<HashMap<String, Value>> = Mutex::new(HashMap::new());
    let bridge = ScriptedBridge::new(move |url, call| {
        let mut records = records.lock().unwrap();
        let key = url.rsplit('/').next().unwrap_or_default().to_string();
        let body: Value = serde_json::from_str(call.data.as_deref().unwrap_or("null")).unwrap();
        match (call.method, records.get_mut(&key)) {
            (Method::Patch, Some(Value::Object(existing))) => {
                if let Value::Object(changes) = body {
                    existing.extend(changes);
                }
                ok(204, Value::Null)
            }
            (Method::Patch, _) => {
                records.insert(key, body);
                ok(201, json!({"id": "003U", "success": true, "created": true}))
            }
            _ => ok(200, json!({"size": records.len(), "record": records.values().next()})),
        }
    });
    let client = canvas_client(bridge.clone(), ErrorMode::Throw);

    let first = client
        .upsert(UpsertRequest::new(
            "Contact",
            "Badge__c",
            "B-42",
            json!({"LastName": "Hopper", "Title": "Lieutenant"}),
        ))
        .await
        .unwrap();
    assert_eq!(first.upsert_outcome(), UpsertOutcome::Created { id: "003U".into() });

    let second = client
        .upsert(UpsertRequest::new("Contact", "Badge__c", "B-42", json!({"Title": "Rear Admiral"})))
        .await
        .unwrap();
    assert_eq!(second.upsert_outcome(), UpsertOutcome::Updated);

    let state = client.retrieve(RetrieveRequest::new("Contact", "003U")).await.unwrap();
    assert_eq!(state.data["size"], 1);
    assert_eq!(state.data["record"]["Title"], "Rear Admiral");

    let calls = bridge.calls();
    assert!(calls[0].0.ends_with("/sobjects/Contact/Badge__c/B-42"));
}
