use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use dualforce_client::{ApiError, Method, Request, ResponseEnvelope, Result};

use crate::composite::{BatchRequest, CreateTreeRequest};

impl super::SalesforceClient {
    /// Send up to 25 subrequests in one composite call.
    ///
    /// Subrequest URLs may be absolute, `/services/data/vXX.X/...` paths or
    /// paths relative to the data root; all are rewritten to the client's
    /// version. `data` is the `compositeResponse` array.
    #[instrument(skip(self, request), fields(subrequests = request.requests.len()))]
    pub async fn batch(&self, request: BatchRequest) -> Result<ResponseEnvelope> {
        request.validate()?;

        let endpoints = match self.prepare(Method::Post).await {
            Ok(endpoints) => endpoints,
            Err(outcome) => return outcome,
        };
        let body = serde_json::to_value(request.to_composite(&endpoints)?)?;

        let envelope = self
            .send(Request::new(Method::Post, endpoints.data_url("composite")).json(body))
            .await?;
        if !envelope.ok {
            return Ok(envelope);
        }

        let data = envelope
            .raw
            .get("compositeResponse")
            .cloned()
            .unwrap_or_else(|| envelope.raw.clone());
        Ok(envelope.with_data(data))
    }

    /// Insert record trees, at most 200 records per call.
    ///
    /// Chunks are sent in order and a failed chunk does not stop the rest.
    /// `data` holds one marker per chunk (`{chunk, ok, status, payload}`) and
    /// `raw` the chunk responses. Only when every chunk fails does the error
    /// mode apply.
    #[instrument(
        skip(self, request),
        fields(sobject = %request.sobject, records = request.records.len())
    )]
    pub async fn create_tree(&self, request: CreateTreeRequest) -> Result<ResponseEnvelope> {
        request.validate()?;

        let endpoints = match self.prepare(Method::Post).await {
            Ok(endpoints) => endpoints,
            Err(outcome) => return outcome,
        };
        let url = endpoints.data_url(&format!("composite/tree/{}", request.sobject));

        let mut markers = Vec::new();
        let mut raw = Vec::new();
        let mut status = 0;
        let mut succeeded = 0;
        let mut last_error = None;

        for (chunk, body) in request.chunk_bodies().into_iter().enumerate() {
            debug!(chunk, "sending record tree chunk");
            match self.call(Request::new(Method::Post, url.clone()).json(body)).await {
                Ok(call) => {
                    succeeded += 1;
                    if last_error.is_none() {
                        status = call.status;
                    }
                    markers.push(json!({
                        "chunk": chunk,
                        "ok": true,
                        "status": call.status,
                        "payload": call.payload,
                    }));
                    raw.push(call.payload);
                }
                Err(err) if err.is_config_error() => return Err(err),
                Err(err) => {
                    warn!(chunk, error = %err, "record tree chunk failed");
                    status = err.http_status;
                    let payload = err.payload.clone().unwrap_or(Value::Null);
                    markers.push(json!({
                        "chunk": chunk,
                        "ok": false,
                        "status": err.http_status,
                        "payload": payload,
                        "error": ApiError::from(&err),
                    }));
                    raw.push(payload);
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) if succeeded == 0 => self.finish(Err(err), Method::Post, &url),
            last_error => Ok(ResponseEnvelope {
                ok: last_error.is_none(),
                status,
                data: Value::Array(markers),
                raw: Value::Array(raw),
                error: last_error.as_ref().map(ApiError::from),
                method: Method::Post,
                url,
                source: self.source(),
                meta: None,
            }),
        }
    }
}
