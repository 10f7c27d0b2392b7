use serde::{Deserialize, Serialize};

use super::filter::FilterEffect;
use crate::util::unix_now;

/// Identifier assigned by the store on creation.
pub type PhotoId = u64;

/// A persisted photo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    /// Store-assigned identifier
    pub photo_id: PhotoId,

    /// Media key of the uploaded image (e.g. "photos/3f2c....jpg")
    pub path: String,

    /// Effect applied when the photo is rendered
    pub filter_effects: FilterEffect,

    /// User name of the uploader
    pub owner: String,

    /// Creation time, Unix epoch seconds
    pub uploaded_at: u64,
}

/// A validated photo waiting for an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub path: String,
    pub filter_effects: FilterEffect,
    pub owner: String,
}

impl NewPhoto {
    pub fn new(
        owner: impl Into<String>,
        path: impl Into<String>,
        filter_effects: FilterEffect,
    ) -> Self {
        Self {
            path: path.into(),
            filter_effects,
            owner: owner.into(),
        }
    }

    /// Attach an id and the current time.
    pub(crate) fn into_photo(self, photo_id: PhotoId) -> Photo {
        Photo {
            photo_id,
            path: self.path,
            filter_effects: self.filter_effects,
            owner: self.owner,
            uploaded_at: unix_now(),
        }
    }
}
