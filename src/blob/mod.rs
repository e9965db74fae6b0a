//! Object store adapter for meme images.
//!
//! Images are stored opaquely under a flat key namespace:
//!
//! ```text
//! {id}.{extension}      e.g. "42.png"
//! ```
//!
//! The [`BlobStore`] trait keeps the HTTP layer independent of the backend.
//! [`S3BlobStore`] talks to S3 or any S3-compatible service (MinIO, etc.).

mod s3;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::IoError;

pub use s3::{create_s3_client, S3BlobStore};

/// Stream of image bytes read from the object store.
pub type BlobStream = Pin<Box<dyn Stream<Item = Result<Bytes, IoError>> + Send>>;

/// An object fetched from the store.
pub struct BlobObject {
    /// Object size in bytes, when the backend reports it
    pub content_length: Option<u64>,

    /// The object's bytes
    pub stream: BlobStream,
}

impl std::fmt::Debug for BlobObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobObject")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Build the object key for a meme.
pub fn blob_key(id: i64, extension: &str) -> String {
    format!("{}.{}", id, extension)
}

/// Storage backend for image bytes.
///
/// No retries and no existence checks: a missing key surfaces as
/// [`IoError::NotFound`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), IoError>;

    /// Open the object at `key` for streaming.
    async fn get(&self, key: &str) -> Result<BlobObject, IoError>;

    /// Remove the object at `key`.
    async fn delete(&self, key: &str) -> Result<(), IoError>;
}
