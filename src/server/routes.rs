//! Router configuration for the photo service.
//!
//! This module defines the HTTP routes and applies middleware for sessions,
//! upload limits, CORS and tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health                          - Health check (public)
//! /api/photo/                      - List (GET) and upload (POST)
//! /api/photo/{photo_id}/           - Fetch (GET) and delete (DELETE)
//! /api/photo/{photo_id}/image      - Rendered JPEG with the photo's effect
//! ```
//!
//! Every photo route answers with and without the trailing slash.
//!
//! # Example
//!
//! ```ignore
//! use photo_effects::media::LocalMediaStore;
//! use photo_effects::photo::MemoryPhotoStore;
//! use photo_effects::server::routes::{create_router, RouterConfig};
//!
//! let config = RouterConfig::new("my-secret-key")
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(MemoryPhotoStore::new(), LocalMediaStore::new("./media"), config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{session_middleware, SessionAuth};
use super::handlers::{
    create_photo_handler, delete_photo_handler, get_photo_handler, health_handler,
    list_photos_handler, photo_image_handler, AppState,
};
use crate::media::{MediaStore, DEFAULT_JPEG_QUALITY};
use crate::photo::PhotoStore;

/// Default upload body limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Secret key for session tokens
    pub session_secret: String,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Maximum request body size for uploads
    pub max_upload_bytes: usize,

    /// Default JPEG quality for rendered images
    pub jpeg_quality: u8,

    /// Cache-Control max-age in seconds for rendered images
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration with the given session secret.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Uploads are limited to 10 MiB
    /// - Rendered images use JPEG quality 80 and a 1 hour max-age
    /// - Tracing is enabled
    pub fn new(session_secret: impl Into<String>) -> Self {
        Self {
            session_secret: session_secret.into(),
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            cache_max_age: 3600,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Set the default JPEG quality for rendered images.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Session resolution runs as middleware on every route, but only the photo
/// handlers demand an [`Identity`](super::auth::Identity). Because that
/// extractor precedes the multipart body, anonymous uploads are refused
/// before any part of the form is read.
pub fn create_router<P, M>(photos: P, media: M, config: RouterConfig) -> Router
where
    P: PhotoStore + 'static,
    M: MediaStore + 'static,
{
    let app_state = AppState::new(photos, media)
        .with_jpeg_quality(config.jpeg_quality)
        .with_cache_max_age(config.cache_max_age);

    let auth = SessionAuth::new(&config.session_secret);
    let cors = build_cors_layer(&config);

    let photo_routes = Router::new()
        .route(
            "/api/photo",
            get(list_photos_handler::<P, M>).post(create_photo_handler::<P, M>),
        )
        .route(
            "/api/photo/",
            get(list_photos_handler::<P, M>).post(create_photo_handler::<P, M>),
        )
        .route(
            "/api/photo/{photo_id}",
            get(get_photo_handler::<P, M>).delete(delete_photo_handler::<P, M>),
        )
        .route(
            "/api/photo/{photo_id}/",
            get(get_photo_handler::<P, M>).delete(delete_photo_handler::<P, M>),
        )
        .route(
            "/api/photo/{photo_id}/image",
            get(photo_image_handler::<P, M>),
        )
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(middleware::from_fn_with_state(auth, session_middleware));

    let public_routes = Router::new().route("/health", get(health_handler));

    let router = Router::new()
        .merge(photo_routes)
        .merge(public_routes)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
