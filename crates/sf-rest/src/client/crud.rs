use tracing::instrument;

use dualforce_client::security::url::encode_param;
use dualforce_client::{Method, Request, ResponseEnvelope, Result};

use crate::sobject::{CreateRequest, DeleteRequest, RetrieveRequest, UpdateRequest, UpsertRequest};

impl super::SalesforceClient {
    /// Get a record by id.
    #[instrument(skip(self, request), fields(sobject = %request.sobject, id = %request.id))]
    pub async fn retrieve(&self, request: RetrieveRequest) -> Result<ResponseEnvelope> {
        request.validate()?;
        self.dispatch(Method::Get, |endpoints| {
            let url = endpoints.data_url(&format!(
                "sobjects/{}/{}",
                request.sobject,
                encode_param(&request.id)
            ));
            let get = Request::new(Method::Get, url);
            if request.fields.is_empty() {
                get
            } else {
                get.param("fields", request.fields.join(","))
            }
        })
        .await
    }

    /// Create a record. `data` is `{id, success, errors}`.
    #[instrument(skip(self, request), fields(sobject = %request.sobject))]
    pub async fn create(&self, request: CreateRequest) -> Result<ResponseEnvelope> {
        request.validate()?;
        let CreateRequest { sobject, record } = request;
        self.dispatch(Method::Post, |endpoints| {
            Request::new(Method::Post, endpoints.data_url(&format!("sobjects/{sobject}")))
                .json(record)
        })
        .await
    }

    /// Update fields of a record. Salesforce answers with an empty body.
    #[instrument(skip(self, request), fields(sobject = %request.sobject, id = %request.id))]
    pub async fn update(&self, request: UpdateRequest) -> Result<ResponseEnvelope> {
        request.validate()?;
        let UpdateRequest { sobject, id, record } = request;
        self.dispatch(Method::Patch, |endpoints| {
            let path = format!("sobjects/{sobject}/{}", encode_param(&id));
            Request::new(Method::Patch, endpoints.data_url(&path)).json(record)
        })
        .await
    }

    /// Insert or update a record matched on an external id field.
    ///
    /// See [`ResponseEnvelope::upsert_outcome`] for telling the two apart.
    #[instrument(
        skip(self, request),
        fields(sobject = %request.sobject, field = %request.external_id_field)
    )]
    pub async fn upsert(&self, request: UpsertRequest) -> Result<ResponseEnvelope> {
        request.validate()?;
        let UpsertRequest {
            sobject,
            external_id_field,
            external_id_value,
            record,
        } = request;
        self.dispatch(Method::Patch, |endpoints| {
            let path = format!(
                "sobjects/{sobject}/{external_id_field}/{}",
                encode_param(&external_id_value)
            );
            Request::new(Method::Patch, endpoints.data_url(&path)).json(record)
        })
        .await
    }

    /// Delete a record by id.
    #[instrument(skip(self, request), fields(sobject = %request.sobject, id = %request.id))]
    pub async fn delete(&self, request: DeleteRequest) -> Result<ResponseEnvelope> {
        request.validate()?;
        self.dispatch(Method::Delete, |endpoints| {
            let path = format!("sobjects/{}/{}", request.sobject, encode_param(&request.id));
            Request::new(Method::Delete, endpoints.data_url(&path))
        })
        .await
    }
}
