use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use crate::entity::{FileResource, FileType};
use crate::gallery::{ExtensionQueryResult, QueryParam, VsCodeAdapter};
use crate::server::AppState;
use crate::Error;
use std::sync::Arc;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler failure mapped to an HTTP response
#[derive(Debug)]
pub enum ApiError {
    /// 404 without a body
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(_) | Error::UnknownAssetType(_) => ApiError::NotFound,
            Error::InvalidQuery(msg) => ApiError::BadRequest(msg),
            other => {
                tracing::error!("Request failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::BadRequest(error) => (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response(),
            ApiError::Internal(error) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error })).into_response()
            }
        }
    }
}

pub async fn extension_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryParam>, JsonRejection>,
) -> Result<Json<ExtensionQueryResult>, ApiError> {
    let Json(param) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let result = blocking(state, move |adapter| adapter.query(&param)).await?;
    Ok(Json(result))
}

pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path((namespace, extension, version, asset_type)): Path<(String, String, String, String)>,
) -> Result<Response, ApiError> {
    let file = blocking(state, move |adapter| adapter.asset(&namespace, &extension, &version, &asset_type))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(file_response(file))
}

pub async fn get_vspackage(
    State(state): State<Arc<AppState>>,
    Path((namespace, extension, version)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let file = blocking(state, move |adapter| adapter.file(&namespace, &extension, &version, FileType::Download))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(file_response(file))
}

/// Run a storage-bound adapter call on the blocking pool
async fn blocking<T, F>(state: Arc<AppState>, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&VsCodeAdapter) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || call(&state.adapter))
        .await
        .map_err(|e| {
            tracing::error!("Adapter task failed: {}", e);
            ApiError::Internal(e.to_string())
        })?;
    Ok(result?)
}

fn file_response(file: FileResource) -> Response {
    let content_type = mime_guess::from_path(&file.name).first_or_octet_stream();
    ([(header::CONTENT_TYPE, content_type.to_string())], file.content).into_response()
}
