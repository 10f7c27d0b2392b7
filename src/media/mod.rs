//! Uploaded image storage and effect rendering.
//!
//! - [`MediaStore`]: where uploaded bytes live, keyed by relative path
//! - [`LocalMediaStore`]: directory-backed store used by the server binary
//! - [`MemoryMediaStore`]: in-memory store for tests and embedding
//! - [`sniff`] / [`render_jpeg`]: image validation and filter rendering

mod render;
mod store;

pub use render::{
    apply_effect, is_valid_quality, render_jpeg, sniff, ImageInfo, DEFAULT_JPEG_QUALITY,
    MAX_IMAGE_PIXELS, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY, SUPPORTED_FORMATS,
};
#[cfg(test)]
pub(crate) use render::png_header_only;
pub use store::{validate_key, LocalMediaStore, MediaStore, MemoryMediaStore};

/// Build a fresh media key for an upload with the given extension.
pub fn new_media_key(extension: &str) -> String {
    format!("photos/{}.{}", uuid::Uuid::new_v4(), extension)
}
