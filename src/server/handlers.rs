//! HTTP request handlers for the photo API.
//!
//! # Endpoints
//!
//! - `POST /api/photo/` - Upload a photo with a filter effect
//! - `GET /api/photo/` - List the caller's photos
//! - `GET /api/photo/{photo_id}/` - Fetch one photo record
//! - `DELETE /api/photo/{photo_id}/` - Delete a photo
//! - `GET /api/photo/{photo_id}/image` - Render a photo with its effect
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
        Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{MediaError, RenderError, StoreError};
use crate::media::{new_media_key, render_jpeg, MediaStore, DEFAULT_JPEG_QUALITY};
use crate::photo::{NewPhoto, Photo, PhotoId, PhotoStore};

use super::auth::Identity;
use super::form::{PhotoForm, ValidationErrors};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state: the record store and the media store.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<P: PhotoStore, M: MediaStore> {
    /// Photo records
    pub photos: Arc<P>,

    /// Uploaded image bytes
    pub media: Arc<M>,

    /// Default JPEG quality for rendered images
    pub jpeg_quality: u8,

    /// Cache-Control max-age for rendered images, in seconds
    pub cache_max_age: u32,
}

impl<P: PhotoStore, M: MediaStore> AppState<P, M> {
    /// Create a new application state with default render settings.
    pub fn new(photos: P, media: M) -> Self {
        Self {
            photos: Arc::new(photos),
            media: Arc::new(media),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            cache_max_age: 3600,
        }
    }

    /// Set the default JPEG quality for rendered images.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Set the Cache-Control max-age for rendered images.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }
}

impl<P: PhotoStore, M: MediaStore> Clone for AppState<P, M> {
    fn clone(&self) -> Self {
        Self {
            photos: Arc::clone(&self.photos),
            media: Arc::clone(&self.media),
            jpeg_quality: self.jpeg_quality,
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Query parameters for rendered images.
#[derive(Debug, Deserialize)]
pub struct RenderQueryParams {
    /// JPEG quality (1-100, defaults to the server setting)
    #[serde(default)]
    pub quality: Option<u8>,
}

/// JSON error body for every non-validation error.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub detail: String,

    /// Error type identifier (e.g., "not_found", "not_authenticated")
    pub code: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            code: code.into(),
        }
    }
}

/// Body of a successful upload.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    /// Always contains "Success"
    pub status: String,

    /// The stored record
    pub photo: Photo,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Everything a photo handler can fail with after authentication.
#[derive(Debug)]
pub enum ApiError {
    /// One or more form fields are invalid
    Validation(ValidationErrors),

    /// The request body could not be parsed as multipart
    Malformed { status: StatusCode, message: String },

    /// Query string could not be parsed (e.g. `quality=abc`)
    InvalidQuery(String),

    /// No such photo for this caller
    NotFound,

    Store(StoreError),
    Media(MediaError),
    Render(RenderError),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Malformed {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        ApiError::Media(err)
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        ApiError::Render(err)
    }
}

/// Convert ApiError to HTTP response.
///
/// - 4xx errors are logged at DEBUG level (client errors)
/// - 5xx errors are logged at ERROR level (server errors)
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Validation(errors) => {
                debug!(
                    status = StatusCode::BAD_REQUEST.as_u16(),
                    fields = ?errors.fields().collect::<Vec<_>>(),
                    "Validation failed"
                );
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }

            ApiError::Malformed { status, message } => (status, "malformed_request", message),

            ApiError::InvalidQuery(message) => (StatusCode::BAD_REQUEST, "invalid_quality", message),

            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Not found.".to_string()),

            ApiError::Store(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                err.to_string(),
            ),

            ApiError::Media(err) => match err {
                MediaError::NotFound(key) => (
                    StatusCode::NOT_FOUND,
                    "media_missing",
                    format!("Image file missing: {}", key),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "media_error",
                    err.to_string(),
                ),
            },

            ApiError::Render(err) => match err {
                RenderError::InvalidQuality { .. } => {
                    (StatusCode::BAD_REQUEST, "invalid_quality", err.to_string())
                }
                RenderError::Decode { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "decode_error",
                    err.to_string(),
                ),
                RenderError::Encode { .. } | RenderError::Task(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "render_error",
                    err.to_string(),
                ),
            },
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        (status, Json(ErrorResponse::new(message, error_type))).into_response()
    }
}

/// Parse a path segment as a photo id. Anything unparsable is simply absent.
fn parse_photo_id(raw: &str) -> Result<PhotoId, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle photo uploads.
///
/// # Endpoint
///
/// `POST /api/photo/` with a `multipart/form-data` body
///
/// # Form Fields
///
/// - `path`: the image file (JPEG or PNG)
/// - `filter_effects`: one of the supported effect names, e.g. `BLUR`
///
/// # Response
///
/// `201 Created` with JSON body:
/// ```json
/// {
///   "status": "Success",
///   "photo": { "photo_id": 1, "path": "photos/....png", "filter_effects": "BLUR", ... }
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: No valid session (checked before the body is read)
/// - `400 Bad Request`: Field errors, keyed by field name
/// - `413 Payload Too Large`: Body exceeds the upload limit
pub async fn create_photo_handler<P, M>(
    State(state): State<AppState<P, M>>,
    identity: Identity,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError>
where
    P: PhotoStore + 'static,
    M: MediaStore + 'static,
{
    let form = PhotoForm::from_multipart(multipart?).await?;
    let upload = form.validate()?;

    let key = new_media_key(upload.info.extension());
    state.media.save(&key, upload.data).await?;

    let new_photo = NewPhoto::new(identity.user.as_str(), key.as_str(), upload.filter_effects);
    let photo = match state.photos.create(new_photo).await {
        Ok(photo) => photo,
        Err(err) => {
            // Don't leave an orphaned file behind
            if let Err(cleanup_err) = state.media.remove(&key).await {
                warn!(key = %key, error = %cleanup_err, "Failed to remove orphaned upload");
            }
            return Err(err.into());
        }
    };

    info!(
        photo_id = photo.photo_id,
        owner = %photo.owner,
        file_name = %upload.file_name,
        filter_effects = %photo.filter_effects,
        width = upload.info.width,
        height = upload.info.height,
        "Photo uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            status: "Success".to_string(),
            photo,
        }),
    ))
}

/// Handle photo list requests.
///
/// # Endpoint
///
/// `GET /api/photo/`
///
/// # Response
///
/// `200 OK` with a JSON array of the caller's photos, oldest first.
pub async fn list_photos_handler<P, M>(
    State(state): State<AppState<P, M>>,
    identity: Identity,
) -> Result<Json<Vec<Photo>>, ApiError>
where
    P: PhotoStore + 'static,
    M: MediaStore + 'static,
{
    let photos = state.photos.list_by_owner(&identity.user).await?;
    Ok(Json(photos))
}

/// Handle single photo requests.
///
/// # Endpoint
///
/// `GET /api/photo/{photo_id}/`
///
/// # Errors
///
/// - `404 Not Found`: No such photo, or it belongs to someone else
pub async fn get_photo_handler<P, M>(
    State(state): State<AppState<P, M>>,
    identity: Identity,
    Path(photo_id): Path<String>,
) -> Result<Json<Photo>, ApiError>
where
    P: PhotoStore + 'static,
    M: MediaStore + 'static,
{
    let photo_id = parse_photo_id(&photo_id)?;
    let photo = state
        .photos
        .get(photo_id, &identity.user)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(photo))
}

/// Handle photo deletion.
///
/// # Endpoint
///
/// `DELETE /api/photo/{photo_id}/`
///
/// # Response
///
/// `204 No Content` with an empty body.
///
/// # Errors
///
/// - `404 Not Found`: No such photo, or it belongs to someone else
pub async fn delete_photo_handler<P, M>(
    State(state): State<AppState<P, M>>,
    identity: Identity,
    Path(photo_id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    P: PhotoStore + 'static,
    M: MediaStore + 'static,
{
    let photo_id = parse_photo_id(&photo_id)?;
    let removed = state
        .photos
        .delete(photo_id, &identity.user)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Err(err) = state.media.remove(&removed.path).await {
        warn!(photo_id, key = %removed.path, error = %err, "Failed to remove photo file");
    }

    info!(photo_id, owner = %identity.user, "Photo deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Handle rendered image requests.
///
/// # Endpoint
///
/// `GET /api/photo/{photo_id}/image`
///
/// # Query Parameters
///
/// - `quality`: JPEG quality 1-100 (default: server setting)
///
/// # Response
///
/// `200 OK` with the photo's filter effect applied, as `image/jpeg`.
///
/// # Errors
///
/// - `400 Bad Request`: Quality outside 1-100 or not a number
/// - `404 Not Found`: No such photo for this caller, or its file is gone
/// - `500 Internal Server Error`: Stored file could not be decoded
pub async fn photo_image_handler<P, M>(
    State(state): State<AppState<P, M>>,
    identity: Identity,
    Path(photo_id): Path<String>,
    query: Result<Query<RenderQueryParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
    P: PhotoStore + 'static,
    M: MediaStore + 'static,
{
    let photo_id = parse_photo_id(&photo_id)?;
    let Query(query) = query?;
    let photo = state
        .photos
        .get(photo_id, &identity.user)
        .await?
        .ok_or(ApiError::NotFound)?;

    let quality = query.quality.unwrap_or(state.jpeg_quality);
    let source = state.media.load(&photo.path).await?;
    let effect = photo.filter_effects;

    let jpeg = tokio::task::spawn_blocking(move || render_jpeg(&source, effect, quality))
        .await
        .map_err(|e| RenderError::Task(e.to_string()))??;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/jpeg".to_string()),
            (
                header::CACHE_CONTROL,
                format!("private, max-age={}", state.cache_max_age),
            ),
            (
                header::HeaderName::from_static("x-filter-effect"),
                effect.to_string(),
            ),
        ],
        jpeg,
    )
        .into_response())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
