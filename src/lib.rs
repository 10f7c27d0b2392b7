//! # Photo Effects
//!
//! An authenticated photo upload service. Each photo carries a filter effect
//! (blur, emboss, sharpen, ...) that is applied when the image is rendered.
//!
//! ## Features
//!
//! - **Owner-scoped records**: callers only ever see and delete their own photos
//! - **Validated uploads**: multipart forms are checked field by field, with
//!   every error reported at once
//! - **Signed sessions**: HMAC-SHA256 session tokens in a cookie or bearer header
//! - **Filter rendering**: convolution filters applied on demand, served as JPEG
//!
//! ## Architecture
//!
//! - [`photo`] - Photo records, filter effects and the record store
//! - [`media`] - Image storage, sniffing and effect rendering
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types for the storage and rendering layers
//!
//! ## Example
//!
//! ```rust,no_run
//! use photo_effects::{create_router, LocalMediaStore, MemoryPhotoStore, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = create_router(
//!         MemoryPhotoStore::new(),
//!         LocalMediaStore::new("./media"),
//!         RouterConfig::new("a-long-random-session-secret"),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod media;
pub mod photo;
pub mod server;
mod util;

// Re-export commonly used types
pub use config::{Cli, Command, ServeConfig, SessionConfig, SessionOutputFormat};
pub use error::{MediaError, RenderError, StoreError};
pub use media::{
    render_jpeg, sniff, ImageInfo, LocalMediaStore, MediaStore, MemoryMediaStore,
    DEFAULT_JPEG_QUALITY,
};
pub use photo::{FilterEffect, MemoryPhotoStore, NewPhoto, Photo, PhotoId, PhotoStore};
pub use server::{
    create_router, health_handler, ApiError, AppState, AuthError, ErrorResponse, HealthResponse,
    Identity, RouterConfig, SessionAuth, ValidationErrors,
};
