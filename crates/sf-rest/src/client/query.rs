use serde_json::Value;
use tracing::{debug, instrument, warn};

use dualforce_client::{ApiError, Error, Meta, Method, Request, ResponseEnvelope, Result};

use crate::query::{QueryPage, QueryRequest};

impl super::SalesforceClient {
    /// Execute a SOQL query.
    ///
    /// By default every page is followed and `data` holds all records in
    /// order; `meta.page_count` is the number of records and `meta.pages` the
    /// number of pages fetched. If a later page fails the records gathered so
    /// far are returned with `ok = false`, whatever the error mode.
    ///
    /// # Security
    ///
    /// Values interpolated into the statement must be quoted:
    ///
    /// ```rust,ignore
    /// use dualforce_rest::SalesforceClient;
    ///
    /// let soql = format!(
    ///     "SELECT Id FROM Contact WHERE LastName = {}",
    ///     SalesforceClient::escape_soql(user_input)
    /// );
    /// let contacts = client.query(soql).await?;
    /// ```
    #[instrument(skip(self, request))]
    pub async fn query(&self, request: impl Into<QueryRequest>) -> Result<ResponseEnvelope> {
        let request = request.into();
        if request.soql.trim().is_empty() {
            return Err(Error::invalid_request("soql is required"));
        }

        let endpoints = match self.prepare(Method::Get).await {
            Ok(endpoints) => endpoints,
            Err(outcome) => return outcome,
        };

        let first =
            Request::new(Method::Get, endpoints.query_url.clone()).param("q", &request.soql);
        let url = first.url_with_params();
        let (mut status, payload, first_page) = match self.fetch_page(first).await {
            Ok(page) => page,
            Err(err) => return self.finish(Err(err), Method::Get, &url),
        };

        let total_size = first_page.total_size;
        let mut done = first_page.done;
        let mut next = first_page.next_records_url;
        let mut records = first_page.records;
        let mut raw = vec![payload];
        let mut failure = None;

        while request.page_all {
            let Some(pointer) = next.clone() else {
                break;
            };
            debug!(next_records_url = %pointer, pages = raw.len(), "fetching next page");

            match self
                .fetch_page(Request::new(Method::Get, endpoints.resolve(&pointer)))
                .await
            {
                Ok((page_status, payload, page)) => {
                    status = page_status;
                    done = page.done;
                    next = page.next_records_url;
                    records.extend(page.records);
                    raw.push(payload);
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        next_records_url = %pointer,
                        "query page failed, returning partial result"
                    );
                    status = err.http_status;
                    failure = Some(err);
                    break;
                }
            }
        }

        let meta = Meta {
            total_size,
            done: failure.is_none() && done,
            page_count: records.len(),
            pages: raw.len() as u32,
            next_records_url: next,
            soql: Some(request.soql),
        };

        Ok(ResponseEnvelope {
            ok: failure.is_none(),
            status,
            data: Value::Array(records),
            raw: Value::Array(raw),
            error: failure.as_ref().map(ApiError::from),
            method: Method::Get,
            url,
            source: self.source(),
            meta: Some(meta),
        })
    }

    /// Fetch one page, returning its status, payload and parsed form.
    async fn fetch_page(&self, request: Request) -> Result<(u16, Value, QueryPage)> {
        let call = self.call(request).await?;
        let page: QueryPage = serde_json::from_value(call.payload.clone())?;
        Ok((call.status, call.payload, page))
    }
}
