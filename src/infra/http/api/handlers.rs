use axum::Json;
use axum::body::Body;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Multipart, Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::error;
use uuid::Uuid;

use crate::application::actor::Actor;
use crate::application::listing::ListingQuery;
use crate::application::products::{CreateProductCommand, PhotoUpload, UpdateProductCommand};
use crate::application::storage::StorageError;

use super::error::{ApiError, codes};
use super::state::ApiState;

/// Multipart field carrying the photo on `PUT /api/v1/products/{id}/photo`.
pub const PHOTO_FIELD: &str = "product_photo";

pub async fn list_products(
    State(state): State<ApiState>,
    query: Result<Query<ListingQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|err| {
        ApiError::bad_request("invalid listing parameters", Some(err.body_text()))
    })?;
    let listing = state.catalog.get_listing(query).await?;
    Ok(Json(listing))
}

pub async fn get_product(
    State(state): State<ApiState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = product_id(id)?;
    let detail = state.catalog.get_product_detail(id).await?;
    Ok(Json(detail))
}

pub async fn get_own_product(
    State(state): State<ApiState>,
    Extension(_actor): Extension<Actor>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = product_id(id)?;
    let view = state.catalog.get_own_product_detail(id).await?;
    Ok(Json(view))
}

pub async fn create_product(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<CreateProductCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(cmd) = payload
        .map_err(|err| ApiError::bad_request("invalid product payload", Some(err.body_text())))?;
    let view = state.products.create_product(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_product(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateProductCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = product_id(id)?;
    let Json(cmd) = payload
        .map_err(|err| ApiError::bad_request("invalid product payload", Some(err.body_text())))?;
    let view = state.products.update_product(&actor, id, cmd).await?;
    Ok(Json(view))
}

pub async fn upload_product_photo(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    id: Result<Path<Uuid>, PathRejection>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let id = product_id(id)?;

    let mut file_name = None;
    let mut content_type = None;
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request("invalid multipart payload", Some(err.to_string())))?
    {
        if field.name() == Some(PHOTO_FIELD) {
            file_name = field.file_name().map(|s| s.to_string());
            content_type = field.content_type().map(|s| s.to_string());
            data = Some(field.bytes().await.map_err(|err| {
                ApiError::bad_request("failed to read upload", Some(err.to_string()))
            })?);
            break;
        }
    }

    let file_name = file_name.ok_or_else(missing_photo)?;
    let data = data.ok_or_else(missing_photo)?;
    let content_type = content_type
        .filter(|value| value != "application/octet-stream")
        .unwrap_or_else(|| {
            mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });
    if !content_type.starts_with("image/") {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_PHOTO,
            "product photo must be an image",
            Some(content_type),
        ));
    }

    let view = state
        .products
        .upload_photo(
            &actor,
            id,
            PhotoUpload {
                file_name,
                content_type,
                data,
            },
        )
        .await?;
    Ok(Json(view))
}

pub async fn serve_photo(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    const SOURCE: &str = "infra::http::api::serve_photo";

    match state.photos.read(&name).await {
        Ok(bytes) => Ok(photo_response(&name, bytes)),
        Err(StorageError::InvalidName(_)) => Err(photo_not_found()),
        Err(StorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(photo_not_found())
        }
        Err(err) => {
            error!(target = SOURCE, name = %name, error = %err, "failed to read stored photo");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL,
                "failed to read photo",
                None,
            ))
        }
    }
}

pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    crate::infra::http::db_health_response(state.health.check().await)
}

fn product_id(id: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|err| ApiError::bad_request("invalid product id", Some(err.body_text())))
}

fn missing_photo() -> ApiError {
    ApiError::bad_request(
        "missing product photo",
        Some(format!("expected multipart field `{PHOTO_FIELD}`")),
    )
}

fn photo_not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, "photo not found", None)
}

fn photo_response(name: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(name).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    // Object names are timestamped, so content behind a name never changes.
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}
