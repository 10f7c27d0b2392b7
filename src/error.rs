use thiserror::Error;

/// Errors raised by a photo record store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backing store could not complete the operation
    #[error("Store backend error: {0}")]
    Backend(String),

    /// The store ran out of identifiers
    #[error("Photo id space exhausted")]
    IdsExhausted,
}

/// Errors raised by a media store
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    /// No media exists under the key
    #[error("Media not found: {0}")]
    NotFound(String),

    /// Key is empty, absolute, or escapes the media root
    #[error("Invalid media key: {0}")]
    InvalidKey(String),

    /// Filesystem or backend failure
    #[error("Media I/O error: {0}")]
    Io(String),
}

impl MediaError {
    /// Map an I/O error for `key`, keeping "not found" distinguishable.
    pub fn from_io(key: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => MediaError::NotFound(key.to_string()),
            _ => MediaError::Io(format!("{}: {}", key, err)),
        }
    }
}

/// Errors raised while decoding, filtering or encoding an image
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// Stored bytes are not a decodable image
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Output encoding failed
    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    /// Requested JPEG quality outside 1-100
    #[error("Invalid quality: {quality} (must be 1-100)")]
    InvalidQuality { quality: u8 },

    /// The blocking render task did not complete
    #[error("Render task failed: {0}")]
    Task(String),
}
