//! # dualforce-client
//!
//! Shared vocabulary for the dualforce Salesforce client.
//!
//! Every other crate in the workspace speaks in these types:
//! - [`Error`] / [`SfError`] - the one error shape that leaves the client
//! - [`ResponseEnvelope`] - the one success (or returned failure) shape
//! - [`Endpoints`] - base URLs derived once from a Canvas context or REST URL
//! - [`Request`] / [`CallResult`] - what flows through a transport adapter
//! - [`ClientConfig`] - construction-time configuration
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SalesforceClient (sf-rest)                │
//! │  query / retrieve / create / update / upsert / delete /     │
//! │  batch / create_tree / apex  ->  ResponseEnvelope           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │               TransportAdapter (sf-transport)               │
//! │  CanvasAdapter: verb override + session retry               │
//! │  RestAdapter:   lazy auth + session retry                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │        CanvasBridge / RestProxy host primitives             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod backend_error;
mod config;
mod endpoints;
mod envelope;
mod error;
mod request;
mod retry;
pub mod security;

pub use backend_error::{parse_backend_error, sanitize_error_message, BackendError};
pub use config::{AutoAuthConfig, ClientConfig, ClientConfigBuilder, ErrorMode, Mode};
pub use endpoints::Endpoints;
pub use envelope::{ApiError, CallResult, Meta, ResponseEnvelope, UpsertOutcome};
pub use error::{Error, ErrorKind, Result, SfError};
pub use request::{append_query, Method, Request, Transport};
pub use retry::{RetryBudget, RetryReason};

/// Default Salesforce API version.
pub const DEFAULT_API_VERSION: &str = "61.0";

/// User-Agent string for the reqwest-backed primitives.
pub const USER_AGENT: &str = concat!("dualforce/", env!("CARGO_PKG_VERSION"));
