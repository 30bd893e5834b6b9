//! Record form extractor
//!
//! Create and update requests carry the record as a JSON string in the form
//! field named `record`. Both `application/x-www-form-urlencoded` and
//! `multipart/form-data` bodies are accepted.

use axum::{
    extract::{Form, FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use std::collections::HashMap;
use tracing::{debug, warn};

use pokedex_core::constants::RECORD_FORM_FIELD;
use pokedex_core::Record;

use super::api_handlers::{bad_request, error_response, ApiError};

/// A record decoded from the `record` form field
#[derive(Debug)]
pub struct RecordForm(pub Record);

impl<S> FromRequest<S> for RecordForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let raw = if is_multipart(&req) {
            read_multipart_field(req, state).await?
        } else {
            read_urlencoded_field(req, state).await?
        };

        let raw = raw.ok_or_else(|| {
            warn!("request body has no '{}' field", RECORD_FORM_FIELD);
            bad_request(format!("missing form field '{}'", RECORD_FORM_FIELD))
        })?;

        let record = Record::from_json_str(&raw).map_err(|e| {
            warn!("rejected record payload: {}", e);
            error_response(e)
        })?;
        debug!(fields = record.fields().len(), "record form decoded");
        Ok(RecordForm(record))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|content_type| content_type.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn read_urlencoded_field<S>(req: Request, state: &S) -> Result<Option<String>, ApiError>
where
    S: Send + Sync,
{
    let Form(mut fields) = Form::<HashMap<String, String>>::from_request(req, state)
        .await
        .map_err(|rejection| {
            warn!("form parsing error: {}", rejection.body_text());
            bad_request(rejection.body_text())
        })?;
    Ok(fields.remove(RECORD_FORM_FIELD))
}

async fn read_multipart_field<S>(req: Request, state: &S) -> Result<Option<String>, ApiError>
where
    S: Send + Sync,
{
    let mut multipart = Multipart::from_request(req, state).await.map_err(|rejection| {
        warn!("multipart parsing error: {}", rejection.body_text());
        bad_request(rejection.body_text())
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text()))?
    {
        if field.name() != Some(RECORD_FORM_FIELD) {
            continue;
        }
        let text = field.text().await.map_err(|e| bad_request(e.body_text()))?;
        return Ok(Some(text));
    }

    Ok(None)
}
