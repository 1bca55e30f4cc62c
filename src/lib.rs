//! # dualforce
//!
//! Salesforce API client that runs the same operations over two transports:
//! a Salesforce Canvas host bridge, or a REST proxy holding an OAuth token.
//!
//! ## Security
//!
//! - Tokens and secrets are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - Error messages are sanitized before they reach a caller
//!
//! ## Crates
//!
//! - **dualforce-client** - Shared vocabulary: errors, envelopes, endpoints, config, SOQL literals
//! - **dualforce-auth** - REST credentials, credential cache, OAuth refresh, auth context
//! - **dualforce-transport** - Canvas and REST adapters, transport selection
//! - **dualforce-rest** - Query, CRUD, composite batch and tree, Apex REST
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dualforce::{RestSettings, SalesforceClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dualforce::Error> {
//!     let client = SalesforceClient::builder()
//!         .with_rest_settings(RestSettings::from_env()?)
//!         .build()?;
//!
//!     let accounts = client.query("SELECT Id, Name FROM Account").await?;
//!     for account in accounts.records() {
//!         println!("{}", account["Name"]);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "auth")]
pub use dualforce_auth as auth;
#[cfg(feature = "client")]
pub use dualforce_client as client;
#[cfg(feature = "rest")]
pub use dualforce_rest as rest;
#[cfg(feature = "transport")]
pub use dualforce_transport as transport;

// Re-export commonly used types at the top level
#[cfg(feature = "auth")]
pub use dualforce_auth::{AuthContext, RestSettings};
#[cfg(feature = "client")]
pub use dualforce_client::{
    ClientConfig, Error, ErrorMode, Method, Mode, ResponseEnvelope, Result, Transport,
};
#[cfg(feature = "rest")]
pub use dualforce_rest::SalesforceClient;
#[cfg(feature = "transport")]
pub use dualforce_transport::{CanvasBridge, RestProxy};
