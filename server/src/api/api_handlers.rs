//! HTTP request handlers for the Pokedex API
//!
//! Store calls are synchronous and may fsync, so each one runs on the
//! blocking pool via [`with_collection`].

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request, State},
    http::{header::LOCATION, request::Parts, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use pokedex_core::constants::COLLECTION_PATH;
use pokedex_core::core::AppState;
use pokedex_core::storage::parse_record_id;
use pokedex_core::{Collection, Error, Record, StorageImpl};

use super::record_form::RecordForm;

/// Error body returned with every 4xx and 5xx response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human readable description
    pub message: String,
}

impl ErrorResponse {
    /// Create an error body
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Rejection type shared by the handlers and the record extractor
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Body of a successful create
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    /// The record as stored, including `id` and `createdAt`
    pub record: Record,
}

/// System health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Current system status
    pub status: String,
    /// Server version
    pub version: String,
}

/// 400 with the given message
pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

/// Map a domain error to its HTTP status and body
///
/// Server-side failures are logged in full and answered with a generic message.
pub fn error_response(err: Error) -> ApiError {
    match err {
        Error::Validation(message) => bad_request(message),
        Error::NotFound(message) => (StatusCode::NOT_FOUND, Json(ErrorResponse::new(message))),
        other => {
            error!("request failed: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal server error")),
            )
        }
    }
}

/// Raw `{id}` path segment
///
/// Wraps axum's `Path` so that a segment it cannot decode (bad percent
/// encoding, invalid UTF-8) is answered with a JSON error body.
#[derive(Debug)]
pub struct PokemonId(pub String);

impl<S> FromRequestParts<S> for PokemonId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(PokemonId(id)),
            Err(rejection) => {
                warn!("path parsing error: {}", rejection.body_text());
                Err(bad_request(rejection.body_text()))
            }
        }
    }
}

/// Run a collection operation on the blocking pool
async fn with_collection<B, T, F>(app_state: &AppState<B>, op: F) -> Result<T, ApiError>
where
    B: StorageImpl,
    T: Send + 'static,
    F: FnOnce(&Collection<B>) -> pokedex_core::Result<T> + Send + 'static,
{
    let collection = Arc::clone(&app_state.collection);
    tokio::task::spawn_blocking(move || op(&collection))
        .await
        .map_err(|e| error_response(Error::internal(format!("store task failed: {}", e))))?
        .map_err(error_response)
}

/// Ids on read and delete paths: anything unparseable cannot name a record
fn lookup_id(raw: &str) -> Result<u64, ApiError> {
    parse_record_id(raw).map_err(|_| {
        debug!("unparseable id {:?} treated as missing", raw);
        error_response(Error::not_found(format!("no pokemon with id {}", raw)))
    })
}

/// Create a pokemon from the `record` form field
pub async fn create_pokemon<B: StorageImpl>(
    State(app_state): State<Arc<AppState<B>>>,
    RecordForm(record): RecordForm,
) -> Result<impl IntoResponse, ApiError> {
    let (id, stored) = with_collection(&app_state, move |c| c.create(record)).await?;
    let location = format!("{}/{}", COLLECTION_PATH, id);

    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(CreatedResponse { record: stored }),
    ))
}

/// Fetch one pokemon
pub async fn get_pokemon<B: StorageImpl>(
    State(app_state): State<Arc<AppState<B>>>,
    PokemonId(id): PokemonId,
) -> Result<Json<Record>, ApiError> {
    let id = lookup_id(&id)?;
    let record = with_collection(&app_state, move |c| c.get(id)).await?;
    Ok(Json(record))
}

/// List every pokemon in ascending id order
pub async fn list_pokemons<B: StorageImpl>(
    State(app_state): State<Arc<AppState<B>>>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let records = with_collection(&app_state, |c| c.list()).await?;
    Ok(Json(records))
}

/// Replace the fields of an existing pokemon
///
/// The id is validated and the record's existence checked before the body is
/// read, so a bad id is a 400 and a missing record a 404 whatever was sent.
pub async fn update_pokemon<B: StorageImpl>(
    State(app_state): State<Arc<AppState<B>>>,
    PokemonId(id): PokemonId,
    request: Request,
) -> Result<StatusCode, ApiError> {
    let id = parse_record_id(&id).map_err(|e| {
        warn!("rejected update id {:?}", id);
        error_response(e)
    })?;
    with_collection(&app_state, move |c| c.ensure_exists(id)).await?;

    let RecordForm(record) = RecordForm::from_request(request, &()).await?;
    with_collection(&app_state, move |c| c.update(id, record)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete one pokemon
pub async fn delete_pokemon<B: StorageImpl>(
    State(app_state): State<Arc<AppState<B>>>,
    PokemonId(id): PokemonId,
) -> Result<StatusCode, ApiError> {
    let id = lookup_id(&id)?;
    with_collection(&app_state, move |c| c.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete every pokemon; ids keep counting from where they were
pub async fn delete_all_pokemons<B: StorageImpl>(
    State(app_state): State<Arc<AppState<B>>>,
) -> Result<StatusCode, ApiError> {
    with_collection(&app_state, |c| c.delete_all()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: pokedex_core::VERSION.to_string(),
    })
}
