//! MemeService: coordinates the metadata store and the object store.
//!
//! Write ordering and compensation:
//!
//! - **upload**: insert row → put blob. A failed put soft-deletes the new row.
//! - **update**: put new blob → update row. A failed row update removes the
//!   new blob when it lives under a different key than the old one. After a
//!   committed extension change the old blob is removed. A same-extension
//!   replacement overwrites the old blob in place and cannot be rolled back.
//! - **delete**: soft-delete row → delete blob. The row disappears from reads
//!   first, so a failed blob delete leaves an orphan object, never a
//!   dangling record.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::blob::{blob_key, BlobObject, BlobStore};
use crate::error::{IoError, MemeError};
use crate::store::{normalize_page, MemeRecord, MemeSummary, MemeUpdate, MetadataStore};

use super::upload::ImageUpload;

// =============================================================================
// List Page
// =============================================================================

/// One page of a meme listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListPage<T> {
    /// The page actually served, after normalisation
    pub page: u32,

    /// Highest valid page (0 when there are no memes)
    pub max_page: u32,

    /// Memes on this page
    pub memes: Vec<T>,
}

// =============================================================================
// Meme Service
// =============================================================================

/// Service for listing, serving and mutating memes.
///
/// # Type Parameters
///
/// * `M` - The metadata store (e.g. SQLite)
/// * `B` - The blob store (e.g. S3)
pub struct MemeService<M: MetadataStore, B: BlobStore> {
    metadata: Arc<M>,
    blobs: Arc<B>,
}

impl<M: MetadataStore, B: BlobStore> Clone for MemeService<M, B> {
    fn clone(&self) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
            blobs: Arc::clone(&self.blobs),
        }
    }
}

impl<M: MetadataStore, B: BlobStore> MemeService<M, B> {
    /// Create a new service over the two stores.
    pub fn new(metadata: M, blobs: B) -> Self {
        Self {
            metadata: Arc::new(metadata),
            blobs: Arc::new(blobs),
        }
    }

    /// Get a reference to the metadata store.
    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    /// Get a reference to the blob store.
    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// List active memes as `{id, name}` pairs.
    pub async fn list(&self, page: Option<u32>) -> Result<ListPage<MemeSummary>, MemeError> {
        let max_page = self.metadata.max_page().await?;
        let page = normalize_page(page, max_page);
        let memes = self.metadata.list_page(page).await?;

        Ok(ListPage {
            page,
            max_page,
            memes,
        })
    }

    /// List active memes with every column.
    pub async fn list_full(&self, page: Option<u32>) -> Result<ListPage<MemeRecord>, MemeError> {
        let max_page = self.metadata.max_page().await?;
        let page = normalize_page(page, max_page);
        let memes = self.metadata.list_page_full(page).await?;

        Ok(ListPage {
            page,
            max_page,
            memes,
        })
    }

    /// Fetch an active record or fail with `NotFound`.
    pub async fn get(&self, id: i64) -> Result<MemeRecord, MemeError> {
        self.metadata
            .get(id)
            .await?
            .ok_or(MemeError::NotFound { id })
    }

    /// Resolve an active record and open its image for streaming.
    pub async fn open_image(&self, id: i64) -> Result<(MemeRecord, BlobObject), MemeError> {
        let record = self.get(id).await?;
        let object = self.blobs.get(&record.blob_key()).await?;
        Ok((record, object))
    }

    /// Store a new meme: metadata first (to obtain the id), then the image.
    pub async fn upload(&self, name: &str, image: ImageUpload) -> Result<MemeSummary, MemeError> {
        let id = self
            .metadata
            .insert(name, image.extension(), image.size_mb())
            .await?;
        let key = blob_key(id, image.extension());

        if let Err(err) = self
            .blobs
            .put(&key, image.data().clone(), image.content_type())
            .await
        {
            warn!(id, key = %key, error = %err, "Image upload failed, rolling back record");
            if let Err(rollback_err) = self.metadata.soft_delete(id).await {
                error!(
                    id,
                    error = %rollback_err,
                    "Rollback failed, record has no image"
                );
            }
            return Err(err.into());
        }

        info!(id, key = %key, bytes = image.len(), "Uploaded meme");
        Ok(MemeSummary {
            id,
            name: name.to_string(),
        })
    }

    /// Replace a meme's name and/or image.
    pub async fn update(
        &self,
        id: i64,
        name: Option<String>,
        image: Option<ImageUpload>,
    ) -> Result<MemeRecord, MemeError> {
        let current = self.get(id).await?;
        let old_key = current.blob_key();

        let mut changes = MemeUpdate {
            name,
            ..Default::default()
        };
        let mut new_key = None;

        if let Some(image) = image {
            let key = blob_key(id, image.extension());
            self.blobs
                .put(&key, image.data().clone(), image.content_type())
                .await?;

            changes.size_mb = Some(image.size_mb());
            if image.extension() != current.extension {
                changes.extension = Some(image.extension().to_string());
                new_key = Some(key);
            }
        }

        let updated = match self.metadata.update(id, changes).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.discard_blob(new_key.as_deref()).await;
                return Err(MemeError::NotFound { id });
            }
            Err(err) => {
                self.discard_blob(new_key.as_deref()).await;
                return Err(err.into());
            }
        };

        if new_key.is_some() {
            if let Err(err) = self.blobs.delete(&old_key).await {
                warn!(id, key = %old_key, error = %err, "Failed to remove replaced image");
            }
        }

        info!(id, "Updated meme");
        Ok(updated)
    }

    /// Soft-delete a meme and remove its image.
    pub async fn delete(&self, id: i64) -> Result<MemeRecord, MemeError> {
        let record = self
            .metadata
            .soft_delete(id)
            .await?
            .ok_or(MemeError::NotFound { id })?;
        let key = record.blob_key();

        match self.blobs.delete(&key).await {
            Ok(()) => {}
            Err(IoError::NotFound(_)) => {
                warn!(id, key = %key, "Deleted record had no image");
            }
            Err(err) => {
                error!(id, key = %key, error = %err, "Record deleted but image is orphaned");
                return Err(err.into());
            }
        }

        info!(id, "Deleted meme");
        Ok(record)
    }

    async fn discard_blob(&self, key: Option<&str>) {
        if let Some(key) = key {
            if let Err(err) = self.blobs.delete(key).await {
                warn!(key, error = %err, "Failed to discard uploaded image");
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
