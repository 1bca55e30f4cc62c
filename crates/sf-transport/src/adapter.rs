use async_trait::async_trait;

use dualforce_client::{CallResult, Endpoints, Request, Result, Transport};

/// One way of performing an HTTP call against Salesforce.
///
/// Implementations own their retry rules; callers see either a successful
/// [`CallResult`] or an [`Error`](dualforce_client::Error) already carrying
/// status, code, payload and the call it belongs to.
#[async_trait]
pub trait TransportAdapter: Send + Sync {
    /// Which transport this is.
    fn transport(&self) -> Transport;

    /// Endpoints as currently known. REST adapters learn them on first auth.
    fn endpoints(&self) -> Option<Endpoints>;

    /// Make sure the adapter can serve calls and return its endpoints.
    async fn prepare(&self) -> Result<Endpoints>;

    /// Perform one call.
    async fn ajax(&self, request: Request) -> Result<CallResult>;
}
