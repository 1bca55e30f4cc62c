use tracing::instrument;

use dualforce_client::{Request, ResponseEnvelope, Result};

use crate::apex::ApexRequest;

impl super::SalesforceClient {
    /// Call a custom Apex REST endpoint.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn apex(&self, request: ApexRequest) -> Result<ResponseEnvelope> {
        request.validate()?;
        let ApexRequest {
            method,
            path,
            params,
            body,
        } = request;

        self.dispatch(method, |endpoints| {
            let call = Request::new(method, endpoints.apex_url(&path)).params(params);
            match body {
                Some(body) => call.json(body),
                None => call,
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::rest_client;
    use crate::ApexRequest;
    use dualforce_client::{ErrorMode, Method};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_apex_get_with_params() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/apexrest/accounts/summary"))
            .and(query_param("region", "EMEA"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 12})))
            .expect(1)
            .mount(&server)
            .await;

        let result = rest_client(&server, ErrorMode::Throw)
            .apex(ApexRequest::new(Method::Get, "/accounts/summary").param("region", "EMEA"))
            .await
            .unwrap();
        assert_eq!(result.data["count"], 12);
    }

    #[tokio::test]
    async fn test_apex_post_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/apexrest/orders"))
            .and(body_json(json!({"sku": "X-1", "qty": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("queued")))
            .expect(1)
            .mount(&server)
            .await;

        let result = rest_client(&server, ErrorMode::Throw)
            .apex(ApexRequest::new(Method::Post, "orders").body(json!({"sku": "X-1", "qty": 2})))
            .await
            .unwrap();
        assert_eq!(result.data, json!("queued"));
        assert_eq!(result.method, Method::Post);
    }

    #[tokio::test]
    async fn test_apex_get_with_body_is_rejected() {
        let server = MockServer::start().await;
        let err = rest_client(&server, ErrorMode::Return)
            .apex(ApexRequest::new(Method::Get, "orders").body(json!({})))
            .await
            .unwrap_err();
        assert!(err.is_config_error());
    }
}
