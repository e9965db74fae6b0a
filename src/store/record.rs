//! Rows held by the metadata store.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A meme's metadata row.
///
/// A record whose `delete_date` is set is logically deleted: it stays in the
/// table but is never returned by any read path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemeRecord {
    /// Auto-incrementing primary key
    pub id: i64,

    /// Display name supplied by the uploader
    pub name: String,

    /// File extension without the leading dot (e.g. "png")
    pub extension: String,

    /// Upload size in megabytes, rounded to two decimals
    pub size_mb: f64,

    /// When the record was created
    pub create_date: DateTime<Utc>,

    /// When the record was last updated
    pub update_date: Option<DateTime<Utc>>,

    /// When the record was soft-deleted
    pub delete_date: Option<DateTime<Utc>>,
}

impl MemeRecord {
    /// Whether the record has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.delete_date.is_some()
    }

    /// Object store key holding this record's image.
    pub fn blob_key(&self) -> String {
        crate::blob::blob_key(self.id, &self.extension)
    }
}

/// The `{id, name}` projection served by the public listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemeSummary {
    pub id: i64,
    pub name: String,
}

/// Fields to replace on update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemeUpdate {
    pub name: Option<String>,
    pub extension: Option<String>,
    pub size_mb: Option<f64>,
}

/// The single login row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub name: String,

    /// Hex-encoded salted password hash
    pub password_hash: String,
}

/// Convert a byte count to megabytes rounded to two decimals.
pub fn size_in_mb(bytes: usize) -> f64 {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    (mb * 100.0).round() / 100.0
}
