//! HTTP server layer for the photo service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │           POST/GET /api/photo/   DELETE /api/photo/{id}/        │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌───────────┐  ┌──────────┐  │
//! │  │  handlers   │  │    auth     │  │   form    │  │  routes  │  │
//! │  │ (requests)  │  │ (sessions)  │  │(multipart)│  │ (router) │  │
//! │  └─────────────┘  └─────────────┘  └───────────┘  └──────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod form;
pub mod handlers;
pub mod routes;

pub use auth::{session_middleware, AuthError, Identity, Session, SessionAuth, SESSION_COOKIE};
pub use form::{PhotoForm, UploadedFile, ValidatedUpload, ValidationErrors};
pub use handlers::{
    create_photo_handler, delete_photo_handler, get_photo_handler, health_handler,
    list_photos_handler, photo_image_handler, ApiError, AppState, CreatedResponse, ErrorResponse,
    HealthResponse, RenderQueryParams,
};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_UPLOAD_BYTES};
