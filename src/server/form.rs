//! Multipart upload form for photo creation.
//!
//! The form is read in full first, then validated as a whole so every field
//! error is reported in one `400` response:
//!
//! ```json
//! {
//!   "path": ["No file was submitted."],
//!   "filter_effects": ["This field is required."]
//! }
//! ```

use std::collections::BTreeMap;

use axum::extract::multipart::{Multipart, MultipartError};
use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::media::{sniff, ImageInfo};
use crate::photo::FilterEffect;

/// Form field carrying the image file.
pub const PATH_FIELD: &str = "path";

/// Form field carrying the effect name.
pub const FILTER_FIELD: &str = "filter_effects";

pub const MSG_NO_FILE: &str = "No file was submitted.";
pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_NOT_A_FILE: &str =
    "The submitted data was not a file. Check the encoding type on the form.";
pub const MSG_EMPTY_FILE: &str = "The submitted file is empty.";
pub const MSG_INVALID_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

// =============================================================================
// Validation Errors
// =============================================================================

/// Field name to list of messages, serialized as a flat JSON object.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of the fields that failed.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

// =============================================================================
// Form Collection
// =============================================================================

/// A file part of the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
enum PathValue {
    File(UploadedFile),
    Text,
}

/// Raw, unvalidated photo upload form.
#[derive(Debug, Default, Clone)]
pub struct PhotoForm {
    path: Option<PathValue>,
    filter_effects: Option<String>,
}

impl PhotoForm {
    /// Build a form directly, bypassing multipart parsing.
    pub fn new(path: Option<UploadedFile>, filter_effects: Option<String>) -> Self {
        Self {
            path: path.map(PathValue::File),
            filter_effects,
        }
    }

    /// Read every part of a multipart body.
    ///
    /// Unknown fields are skipped. When a field repeats, the last value wins.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = PhotoForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                PATH_FIELD => match field.file_name().map(str::to_string) {
                    Some(file_name) => {
                        let data = field.bytes().await?;
                        form.path = Some(PathValue::File(UploadedFile { file_name, data }));
                    }
                    None => {
                        // Drain the part; a text value is never a file
                        field.bytes().await?;
                        form.path = Some(PathValue::Text);
                    }
                },
                FILTER_FIELD => {
                    form.filter_effects = Some(field.text().await?);
                }
                _ => {
                    debug!(field = %name, "Ignoring unknown form field");
                }
            }
        }

        Ok(form)
    }

    /// Validate all fields, collecting every error.
    pub fn validate(self) -> Result<ValidatedUpload, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let file = match self.path {
            None => {
                errors.add(PATH_FIELD, MSG_NO_FILE);
                None
            }
            Some(PathValue::Text) => {
                errors.add(PATH_FIELD, MSG_NOT_A_FILE);
                None
            }
            Some(PathValue::File(file)) if file.data.is_empty() => {
                // An untouched file input posts an empty, unnamed part
                let message = if file.file_name.is_empty() {
                    MSG_NO_FILE
                } else {
                    MSG_EMPTY_FILE
                };
                errors.add(PATH_FIELD, message);
                None
            }
            Some(PathValue::File(file)) => match sniff(&file.data) {
                Ok(info) => Some((file, info)),
                Err(err) => {
                    debug!(file_name = %file.file_name, error = %err, "Rejected upload");
                    errors.add(PATH_FIELD, MSG_INVALID_IMAGE);
                    None
                }
            },
        };

        let effect = match self.filter_effects.as_deref() {
            None | Some("") => {
                errors.add(FILTER_FIELD, MSG_REQUIRED);
                None
            }
            Some(name) => match name.parse::<FilterEffect>() {
                Ok(effect) => Some(effect),
                Err(err) => {
                    errors.add(FILTER_FIELD, err.to_string());
                    None
                }
            },
        };

        match (file, effect) {
            (Some((file, info)), Some(filter_effects)) if errors.is_empty() => Ok(ValidatedUpload {
                file_name: file.file_name,
                data: file.data,
                info,
                filter_effects,
            }),
            _ => Err(errors),
        }
    }
}

/// An upload that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub file_name: String,
    pub data: Bytes,
    pub info: ImageInfo,
    pub filter_effects: FilterEffect,
}

// =============================================================================
// Tests
// =============================================================================
