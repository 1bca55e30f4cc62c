use std::sync::Arc;

use tracing::info;

use dualforce_auth::{AuthContextProvider, RestSettings};
use dualforce_client::{ClientConfig, Error, Mode, Result};

use crate::adapter::TransportAdapter;
use crate::canvas::{CanvasAdapter, CanvasBridge};
use crate::rest::{HttpRestProxy, RestAdapter, RestProxy};

/// Host-supplied primitives a client may be built on.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub canvas: Option<Arc<dyn CanvasBridge>>,
    pub rest_proxy: Option<Arc<dyn RestProxy>>,
    /// Explicit instance URL and token; an [`HttpRestProxy`] is built from
    /// them when no `rest_proxy` is given.
    pub rest_settings: Option<RestSettings>,
    pub auth_provider: Option<Arc<dyn AuthContextProvider>>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("canvas", &self.canvas.is_some())
            .field("rest_proxy", &self.rest_proxy.is_some())
            .field("rest_settings", &self.rest_settings)
            .field("auth_provider", &self.auth_provider.is_some())
            .finish()
    }
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_canvas(mut self, bridge: Arc<dyn CanvasBridge>) -> Self {
        self.canvas = Some(bridge);
        self
    }

    pub fn with_rest_proxy(mut self, proxy: Arc<dyn RestProxy>) -> Self {
        self.rest_proxy = Some(proxy);
        self
    }

    pub fn with_rest_settings(mut self, settings: RestSettings) -> Self {
        self.rest_settings = Some(settings);
        self
    }

    pub fn with_auth_provider(mut self, provider: Arc<dyn AuthContextProvider>) -> Self {
        self.auth_provider = Some(provider);
        self
    }

    fn canvas_available(&self) -> bool {
        self.canvas
            .as_ref()
            .is_some_and(|bridge| bridge.context().is_some())
    }
}

/// Choose the one transport a client will use.
///
/// `Mode::Auto` picks Canvas when a bridge with a live context is present and
/// REST otherwise. Missing collaborators for the chosen mode are reported
/// here as a configuration error, never on first call.
pub fn select_transport(
    config: &ClientConfig,
    collaborators: Collaborators,
) -> Result<Arc<dyn TransportAdapter>> {
    let use_canvas = match config.mode {
        Mode::Canvas => true,
        Mode::Rest => false,
        Mode::Auto => collaborators.canvas_available(),
    };

    if use_canvas {
        let bridge = collaborators
            .canvas
            .ok_or_else(|| Error::config("Canvas mode requires a Canvas bridge"))?;
        let adapter = CanvasAdapter::new(bridge, config.api_version.as_deref())?;
        info!(transport = "canvas", "transport selected");
        return Ok(Arc::new(adapter));
    }

    let proxy: Arc<dyn RestProxy> = match (collaborators.rest_proxy, collaborators.rest_settings) {
        (Some(proxy), _) => proxy,
        (None, Some(settings)) => Arc::new(HttpRestProxy::new(settings, config)?),
        (None, None) => {
            return Err(Error::config(match config.mode {
                Mode::Auto => "no Canvas context and no REST proxy or REST settings were supplied",
                _ => "REST mode requires a REST proxy or REST settings",
            }))
        }
    };

    let adapter = RestAdapter::new(proxy, config, collaborators.auth_provider)?;
    info!(transport = "rest", "transport selected");
    Ok(Arc::new(adapter))
}
