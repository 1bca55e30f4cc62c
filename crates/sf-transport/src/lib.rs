//! # dualforce-transport
//!
//! The two ways a dualforce client reaches Salesforce.
//!
//! - [`CanvasAdapter`] talks through a [`CanvasBridge`], the host's
//!   authenticated `ajax` primitive when running inside a Canvas iframe. The
//!   host may refuse some verbs, so a call that gets 405 is resent once as
//!   `POST` with an override marker.
//! - [`RestAdapter`] talks through a [`RestProxy`] that needs a bearer token
//!   and a REST base URL, authenticating lazily on first use.
//!
//! Both retry an expired session exactly once per call.
//!
//! [`select_transport`] picks one adapter per client from a [`ClientConfig`]
//! and the [`Collaborators`] the host supplies.
//!
//! [`ClientConfig`]: dualforce_client::ClientConfig

mod adapter;
mod canvas;
mod rest;
mod select;

#[cfg(test)]
mod test_util;

pub use adapter::TransportAdapter;
pub use canvas::{
    BridgeResponse, CanvasAdapter, CanvasAjax, CanvasBridge, CanvasClient, CanvasContext,
    HttpCanvasBridge,
};
pub use rest::{HttpRestProxy, ProxyRequest, ProxySettings, RestAdapter, RestProxy};
pub use select::{select_transport, Collaborators};

/// Query parameter carrying the original verb of an overridden call.
pub const OVERRIDE_PARAM: &str = "_HttpMethod";

/// Header carrying the original verb of an overridden call.
pub const OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";
