//! Test utilities for integration tests.
//!
//! This module provides an in-process app with shared store handles, a
//! multipart body builder, session helpers and small test images.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use tower::ServiceExt;

use photo_effects::error::StoreError;
use photo_effects::media::{MediaStore, MemoryMediaStore};
use photo_effects::photo::{MemoryPhotoStore, NewPhoto, Photo, PhotoId, PhotoStore};
use photo_effects::{create_router, RouterConfig, SessionAuth};

pub const TEST_SECRET: &str = "test-secret-key-for-session-signing";

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

const BOUNDARY: &str = "----photo-effects-test-boundary";

// =============================================================================
// Test App
// =============================================================================

/// Router plus handles onto the stores it owns.
pub struct TestApp {
    pub router: Router,
    pub photos: MemoryPhotoStore,
    pub media: MemoryMediaStore,
    pub auth: SessionAuth,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::new(TEST_SECRET).with_tracing(false))
    }

    pub fn with_config(config: RouterConfig) -> Self {
        let photos = MemoryPhotoStore::new();
        let media = MemoryMediaStore::new();
        let router = create_router(photos.clone(), media.clone(), config);

        Self {
            router,
            photos,
            media,
            auth: SessionAuth::new(TEST_SECRET),
        }
    }

    /// Send one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// `Cookie` header value carrying a fresh session for `user`.
    pub fn session_cookie(&self, user: &str) -> String {
        let (token, _) = self.auth.issue(user, Duration::from_secs(3600)).unwrap();
        format!("sessionid={}", token)
    }

    /// Upload a PNG with `effect` as `user` and return the created record.
    pub async fn upload_as(&self, user: &str, effect: &str) -> Photo {
        let form = MultipartForm::new()
            .file("path", "photo.png", "image/png", create_png(8, 6))
            .text("filter_effects", effect);
        let response = self
            .send(upload_request(Some(&self.session_cookie(user)), form))
            .await;
        assert_eq!(response.status(), 201, "upload as {} failed", user);

        let json = body_json(response).await;
        serde_json::from_value(json["photo"].clone()).unwrap()
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Builder for `multipart/form-data` bodies.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: Vec<u8>) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(&data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

/// `POST /api/photo/` with an optional session cookie.
pub fn upload_request(cookie: Option<&str>, form: MultipartForm) -> Request<Body> {
    let mut builder = Request::post("/api/photo/")
        .header(header::CONTENT_TYPE, MultipartForm::content_type());
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.finish())).unwrap()
}

/// Bodiless request with an optional session cookie.
pub fn request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

// =============================================================================
// Responses
// =============================================================================

pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let body = body_bytes(response).await;
    serde_json::from_slice(&body).unwrap()
}

// =============================================================================
// Images
// =============================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// A small PNG with a colour gradient.
pub fn create_png(width: u32, height: u32) -> Vec<u8> {
    let image = gradient(width, height);
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(image.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// A small JPEG with a colour gradient.
pub fn create_jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = gradient(width, height);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 90)
        .encode_image(&image)
        .unwrap();
    out
}

/// A PNG carrying only its header: valid dimensions, no pixel data.
///
/// Lets tests claim a huge canvas without allocating it.
pub fn create_png_header_only(width: u32, height: u32) -> Vec<u8> {
    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = 0xFFFF_FFFFu32;
        for &byte in bytes {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
            }
        }
        !crc
    }

    fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        let start = out.len();
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        let crc = crc32(&out[start..]);
        out.extend_from_slice(&crc.to_be_bytes());
    }

    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, 0, 0, 0, 0]);

    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    chunk(&mut out, b"IHDR", &ihdr);
    chunk(&mut out, b"IDAT", &[]);
    chunk(&mut out, b"IEND", &[]);
    out
}

/// Check if data is a valid JPEG (starts with SOI marker, ends with EOI).
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 4 && data[0..2] == [0xFF, 0xD8] && data[data.len() - 2..] == [0xFF, 0xD9]
}

// =============================================================================
// Failing Store
// =============================================================================

/// Photo store whose writes always fail.
pub struct FailingPhotoStore;

#[async_trait]
impl PhotoStore for FailingPhotoStore {
    async fn create(&self, _photo: NewPhoto) -> Result<Photo, StoreError> {
        Err(StoreError::Backend("database unavailable".to_string()))
    }

    async fn list_by_owner(&self, _owner: &str) -> Result<Vec<Photo>, StoreError> {
        Ok(Vec::new())
    }

    async fn get(&self, _photo_id: PhotoId, _owner: &str) -> Result<Option<Photo>, StoreError> {
        Ok(None)
    }

    async fn delete(&self, _photo_id: PhotoId, _owner: &str) -> Result<Option<Photo>, StoreError> {
        Ok(None)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(0)
    }
}

/// Count the media objects in a memory store.
pub async fn media_count(media: &MemoryMediaStore) -> usize {
    media.len().await
}

/// Check a stored object loads.
pub async fn media_exists(media: &MemoryMediaStore, key: &str) -> bool {
    media.load(key).await.is_ok()
}
