use std::sync::Arc;

use dualforce::auth::AuthContextProvider;
use dualforce::rest::{QueryRequest, RetrieveRequest};
use dualforce::{
    AuthContext, ClientConfig, ErrorMode, Mode, RestSettings, SalesforceClient, Transport,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{init_tracing, rest_client, rest_config, session_expired};

fn refreshing_client(server: &MockServer, error_mode: ErrorMode) -> SalesforceClient {
    init_tracing();
    let config = ClientConfig::builder()
        .with_mode(Mode::Rest)
        .with_api_version("61.0")
        .with_error_mode(error_mode)
        .with_auth_ids("005000000000001", "0Hs000000000001")
        .build();
    SalesforceClient::builder()
        .with_config(config)
        .with_rest_settings(RestSettings::new(server.uri(), "stale-token").with_refresh(
            "refresh-token",
            "consumer",
            server.uri(),
        ))
        .build()
        .unwrap()
}

async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "instance_url": server.uri(),
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_rest_expired_session_is_refreshed() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v61.0/sobjects/Contact/003A"))
        .and(header("Authorization", "Bearer stale-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(session_expired()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/data/v61.0/sobjects/Contact/003A"))
        .and(header("Authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Id": "003A"})))
        .expect(1)
        .mount(&server)
        .await;

    let result = refreshing_client(&server, ErrorMode::Throw)
        .retrieve(RetrieveRequest::new("Contact", "003A"))
        .await
        .unwrap();
    assert!(result.ok);
    assert_eq!(result.data["Id"], "003A");
}

#[tokio::test]
async fn test_rest_persistent_401_makes_two_attempts() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v61.0/sobjects/Contact/003A"))
        .respond_with(ResponseTemplate::new(401).set_body_json(session_expired()))
        .expect(2)
        .mount(&server)
        .await;

    let err = refreshing_client(&server, ErrorMode::Throw)
        .retrieve(RetrieveRequest::new("Contact", "003A"))
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
    assert_eq!(err.http_status, 401);
}

#[tokio::test]
async fn test_rest_401_without_reauth_is_returned_as_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v61.0/sobjects/Contact/003A"))
        .respond_with(ResponseTemplate::new(401).set_body_json(session_expired()))
        .expect(4)
        .mount(&server)
        .await;

    // No refresh token and no ids, so each call tries twice with the same token
    let result = rest_client(&server, ErrorMode::Return)
        .retrieve(RetrieveRequest::new("Contact", "003A"))
        .await
        .unwrap();
    assert!(!result.ok);
    assert_eq!(result.status, 401);
    assert_eq!(result.source, Transport::Rest);
    assert_eq!(result.error.unwrap().code.as_deref(), Some("INVALID_SESSION_ID"));

    let err = rest_client(&server, ErrorMode::Throw)
        .retrieve(RetrieveRequest::new("Contact", "003A"))
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
    assert!(!err.is_config_error());
    assert_eq!(err.http_status, 401);
}

#[tokio::test]
async fn test_rest_failed_token_refresh_reports_401() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "expired access/refresh token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/data/v61.0/sobjects/Contact/003A"))
        .respond_with(ResponseTemplate::new(401).set_body_json(session_expired()))
        .expect(2)
        .mount(&server)
        .await;

    let result = refreshing_client(&server, ErrorMode::Return)
        .retrieve(RetrieveRequest::new("Contact", "003A"))
        .await
        .unwrap();
    assert!(!result.ok);
    assert_eq!(result.status, 401);
    assert_eq!(result.error.unwrap().code.as_deref(), Some("INVALID_SESSION_ID"));
}

#[tokio::test]
async fn test_rest_concurrent_calls_share_one_refresh() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer stale-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(session_expired()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Id": "003A"})))
        .mount(&server)
        .await;

    let client = refreshing_client(&server, ErrorMode::Throw);
    let (a, b, c) = tokio::join!(
        client.retrieve(RetrieveRequest::new("Contact", "003A")),
        client.retrieve(RetrieveRequest::new("Contact", "003B")),
        client.retrieve(RetrieveRequest::new("Contact", "003C")),
    );
    assert!(a.unwrap().ok && b.unwrap().ok && c.unwrap().ok);
}

#[tokio::test]
async fn test_rest_lazy_authentication_with_auth_provider() {
    init_tracing();
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v61.0/query"))
        .and(header("Authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": 1,
            "done": true,
            "records": [{"Id": "001A"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider: Arc<dyn AuthContextProvider> =
        Arc::new(|| Some(AuthContext::new("005000000000001", "0Hs000000000001")));
    let settings = RestSettings::default()
        .with_api_version("61.0")
        .with_refresh("refresh-token", "consumer", server.uri());

    let client = SalesforceClient::builder()
        .with_config(rest_config(ErrorMode::Throw))
        .with_rest_settings(settings)
        .with_auth_provider(provider)
        .build()
        .unwrap();

    // Nothing is known until the first call authenticates
    assert!(client.endpoints().is_none());

    let result = client
        .query(QueryRequest::new("SELECT Id FROM Account").first_page())
        .await
        .unwrap();
    assert_eq!(result.records().len(), 1);
    assert_eq!(
        client.endpoints().unwrap().data_base,
        format!("{}/services/data/v61.0", server.uri())
    );
}

#[tokio::test]
async fn test_auto_mode_without_canvas_uses_rest() {
    init_tracing();
    let server = MockServer::start().await;

    let client = SalesforceClient::builder()
        .with_rest_settings(RestSettings::new(server.uri(), "rest-token"))
        .build()
        .unwrap();
    assert_eq!(client.source(), Transport::Rest);
}

#[tokio::test]
async fn test_rest_error_envelope_in_return_mode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v61.0/query"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!([{
            "message": "unexpected token: FORM",
            "errorCode": "MALFORMED_QUERY"
        }])))
        .mount(&server)
        .await;

    let client = rest_client(&server, ErrorMode::Return);
    let result = client.query("SELECT Id FORM Account").await.unwrap();

    assert!(!result.ok);
    assert_eq!(result.status, 400);
    assert_eq!(result.source, Transport::Rest);
    let error = result.error.unwrap();
    assert_eq!(error.code.as_deref(), Some("MALFORMED_QUERY"));
    assert_eq!(error.message, "unexpected token: FORM");
    assert!(result.url.contains("/services/data/v61.0/query?q="));
}
