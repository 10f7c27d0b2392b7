//! Owner-scoped persistence for photo records.
//!
//! [`PhotoStore`] is the seam between the HTTP layer and whatever keeps the
//! records. Every read and delete takes the owner, so a record belonging to
//! someone else looks exactly like a missing one.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;

use super::model::{NewPhoto, Photo, PhotoId};

// =============================================================================
// PhotoStore Trait
// =============================================================================

/// Record store for photos.
///
/// Implementations must make `create` and `delete` atomic per record and
/// must never hand out the same id twice.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Persist a new photo and return it with its assigned id.
    async fn create(&self, photo: NewPhoto) -> Result<Photo, StoreError>;

    /// All photos owned by `owner`, in creation order.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Photo>, StoreError>;

    /// A single photo, if it exists and belongs to `owner`.
    async fn get(&self, photo_id: PhotoId, owner: &str) -> Result<Option<Photo>, StoreError>;

    /// Remove a photo owned by `owner`, returning the removed record.
    ///
    /// Returns `Ok(None)` when there is nothing to delete for this owner.
    async fn delete(&self, photo_id: PhotoId, owner: &str) -> Result<Option<Photo>, StoreError>;

    /// Total number of records across all owners.
    async fn count(&self) -> Result<usize, StoreError>;
}

// =============================================================================
// MemoryPhotoStore
// =============================================================================

#[derive(Debug)]
struct Inner {
    next_id: PhotoId,
    photos: BTreeMap<PhotoId, Photo>,
}

/// In-process photo store.
///
/// Clones share the same records, so a test can keep a handle while the
/// router owns another.
#[derive(Debug, Clone)]
pub struct MemoryPhotoStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryPhotoStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                next_id: 1,
                photos: BTreeMap::new(),
            })),
        }
    }
}

impl Default for MemoryPhotoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhotoStore for MemoryPhotoStore {
    async fn create(&self, photo: NewPhoto) -> Result<Photo, StoreError> {
        let mut inner = self.inner.write().await;

        let photo_id = inner.next_id;
        inner.next_id = photo_id.checked_add(1).ok_or(StoreError::IdsExhausted)?;

        let photo = photo.into_photo(photo_id);
        inner.photos.insert(photo_id, photo.clone());

        debug!(photo_id, owner = %photo.owner, "Photo record created");
        Ok(photo)
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Photo>, StoreError> {
        let inner = self.inner.read().await;
        // BTreeMap iterates in id order, which is creation order
        Ok(inner
            .photos
            .values()
            .filter(|photo| photo.owner == owner)
            .cloned()
            .collect())
    }

    async fn get(&self, photo_id: PhotoId, owner: &str) -> Result<Option<Photo>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .photos
            .get(&photo_id)
            .filter(|photo| photo.owner == owner)
            .cloned())
    }

    async fn delete(&self, photo_id: PhotoId, owner: &str) -> Result<Option<Photo>, StoreError> {
        let mut inner = self.inner.write().await;

        let owned = inner
            .photos
            .get(&photo_id)
            .is_some_and(|photo| photo.owner == owner);
        if !owned {
            return Ok(None);
        }

        let removed = inner.photos.remove(&photo_id);
        debug!(photo_id, owner, "Photo record deleted");
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.photos.len())
    }
}

// =============================================================================
// Tests
// =============================================================================
