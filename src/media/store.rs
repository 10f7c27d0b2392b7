//! Storage backends for uploaded image bytes.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::MediaError;

/// Trait for storing and fetching uploaded images by key.
///
/// Keys are relative, slash-separated paths such as `photos/<uuid>.jpg`.
/// Implementations must reject keys that could escape their storage root.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `data` under `key`, replacing anything already there.
    async fn save(&self, key: &str, data: Bytes) -> Result<(), MediaError>;

    /// Fetch the bytes stored under `key`.
    async fn load(&self, key: &str) -> Result<Bytes, MediaError>;

    /// Remove the bytes stored under `key`.
    async fn remove(&self, key: &str) -> Result<(), MediaError>;
}

/// Check that a key is a plain relative path.
///
/// Empty keys, absolute paths, and `.`/`..` components are rejected.
pub fn validate_key(key: &str) -> Result<(), MediaError> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        return Err(MediaError::InvalidKey(key.to_string()));
    }

    let all_normal = Path::new(key)
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    let no_dot_segments = key.split('/').all(|segment| !segment.is_empty() && segment != ".");

    if all_normal && no_dot_segments {
        Ok(())
    } else {
        Err(MediaError::InvalidKey(key.to_string()))
    }
}

// =============================================================================
// LocalMediaStore
// =============================================================================

/// Media store backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, MediaError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save(&self, key: &str, data: Bytes) -> Result<(), MediaError> {
        let path = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MediaError::from_io(key, e))?;
        }

        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| MediaError::from_io(key, e))?;

        debug!(key, bytes = data.len(), "Stored media");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Bytes, MediaError> {
        let path = self.resolve(key)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| MediaError::from_io(key, e))?;
        Ok(Bytes::from(data))
    }

    async fn remove(&self, key: &str) -> Result<(), MediaError> {
        let path = self.resolve(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| MediaError::from_io(key, e))?;

        debug!(key, "Removed media");
        Ok(())
    }
}

// =============================================================================
// MemoryMediaStore
// =============================================================================

/// Media store that keeps everything in memory.
///
/// Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryMediaStore {
    objects: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn save(&self, key: &str, data: Bytes) -> Result<(), MediaError> {
        validate_key(key)?;
        self.objects.write().await.insert(key.to_string(), data);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Bytes, MediaError> {
        validate_key(key)?;
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| MediaError::NotFound(key.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), MediaError> {
        validate_key(key)?;
        self.objects
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| MediaError::NotFound(key.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
