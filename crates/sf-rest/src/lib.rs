//! # dualforce-rest
//!
//! Transport-agnostic Salesforce operations.
//!
//! ## Features
//!
//! - **SOQL Query** - follows `nextRecordsUrl` and merges every page
//! - **SObject CRUD** - retrieve, create, update, upsert and delete single records
//! - **Composite API** - up to 25 subrequests in one call, version-normalized
//! - **Composite Tree** - record trees in chunks of up to 200 records
//! - **Apex REST** - passthrough to custom `/services/apexrest` endpoints
//!
//! Every operation resolves to a [`ResponseEnvelope`] whether it ran through
//! a Canvas bridge or a REST proxy.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dualforce_rest::{CreateRequest, RetrieveRequest, SalesforceClient};
//! use dualforce_auth::RestSettings;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dualforce_rest::Error> {
//!     let client = SalesforceClient::builder()
//!         .with_rest_settings(RestSettings::from_env()?)
//!         .build()?;
//!
//!     let created = client
//!         .create(CreateRequest::new("Account", serde_json::json!({"Name": "Acme"})))
//!         .await?;
//!     let id = created.data["id"].as_str().unwrap_or_default().to_string();
//!
//!     let account = client
//!         .retrieve(RetrieveRequest::new("Account", id).fields(["Id", "Name"]))
//!         .await?;
//!     println!("{}", account.data["Name"]);
//!
//!     Ok(())
//! }
//! ```

mod apex;
mod client;
mod composite;
mod present;
mod query;
mod sobject;

pub use client::{SalesforceClient, SalesforceClientBuilder};

pub use apex::ApexRequest;
pub use composite::{
    normalize_subrequest_url, BatchRequest, BatchSubrequest, CreateTreeRequest,
    MAX_COMPOSITE_SUBREQUESTS, MAX_TREE_RECORDS,
};
pub use present::{show_error, Presentation, Presenter, TracingPresenter};
pub use query::QueryRequest;
pub use sobject::{CreateRequest, DeleteRequest, RetrieveRequest, UpdateRequest, UpsertRequest};

// Re-export the shared vocabulary
pub use dualforce_client::{
    ApiError, ClientConfig, Endpoints, Error, ErrorKind, ErrorMode, Meta, Method, Mode,
    ResponseEnvelope, Result, SfError, Transport, UpsertOutcome,
};
