use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dualforce::transport::{BridgeResponse, CanvasAjax, CanvasBridge, CanvasClient, CanvasContext};
use dualforce::{ClientConfig, ErrorMode, Mode, RestSettings, SalesforceClient};
use wiremock::MockServer;

pub const INSTANCE_URL: &str = "https://acme.my.salesforce.com";

/// Install a test subscriber once; `RUST_LOG` selects what is printed.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub type BridgeResult = Result<BridgeResponse, BridgeResponse>;

type Script = Box<dyn Fn(&str, &CanvasAjax) -> BridgeResult + Send + Sync>;

/// A Canvas host whose responses come from a closure.
pub struct ScriptedBridge {
    script: Script,
    calls: Mutex<Vec<(String, CanvasAjax)>>,
    refreshes: AtomicU32,
}

impl ScriptedBridge {
    pub fn new(
        script: impl Fn(&str, &CanvasAjax) -> BridgeResult + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            refreshes: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> Vec<(String, CanvasAjax)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn refreshes(&self) -> u32 {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CanvasBridge for ScriptedBridge {
    fn context(&self) -> Option<CanvasContext> {
        Some(CanvasContext::new(INSTANCE_URL).with_rest_link("/services/data/v61.0/"))
    }

    async fn client(&self, refresh: bool) -> dualforce::Result<CanvasClient> {
        let generation = if refresh {
            self.refreshes.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.refreshes.load(Ordering::SeqCst)
        };
        Ok(CanvasClient::new(INSTANCE_URL, format!("canvas-token-{generation}")))
    }

    async fn ajax(&self, url: &str, call: CanvasAjax) -> BridgeResult {
        let outcome = (self.script)(url, &call);
        self.calls.lock().unwrap().push((url.to_string(), call));
        outcome
    }
}

pub fn canvas_client(bridge: Arc<ScriptedBridge>, error_mode: ErrorMode) -> SalesforceClient {
    init_tracing();
    SalesforceClient::builder()
        .with_config(ClientConfig::builder().with_error_mode(error_mode).build())
        .with_canvas(bridge)
        .build()
        .expect("canvas client")
}

pub fn rest_config(error_mode: ErrorMode) -> ClientConfig {
    ClientConfig::builder()
        .with_mode(Mode::Rest)
        .with_api_version("61.0")
        .with_error_mode(error_mode)
        .build()
}

pub fn rest_client(server: &MockServer, error_mode: ErrorMode) -> SalesforceClient {
    init_tracing();
    SalesforceClient::builder()
        .with_config(rest_config(error_mode))
        .with_rest_settings(RestSettings::new(server.uri(), "rest-token"))
        .build()
        .expect("rest client")
}

/// Salesforce's error body for an expired session.
pub fn session_expired() -> serde_json::Value {
    serde_json::json!([{
        "message": "Session expired or invalid",
        "errorCode": "INVALID_SESSION_ID"
    }])
}
