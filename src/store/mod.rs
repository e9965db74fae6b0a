//! Relational metadata store.
//!
//! Meme metadata and the single login credential live in two SQLite tables:
//!
//! ```text
//! info  (id, name, extension, size_mb, create_date, update_date, delete_date)
//! oauth (name, password)
//! ```
//!
//! Handlers never touch SQL directly; they go through the [`MetadataStore`]
//! trait so tests and other engines can stand in for [`SqliteMetadataStore`].

mod page;
mod record;
mod sqlite;

use async_trait::async_trait;

use crate::error::DbError;

pub use page::{max_page_for, normalize_page, page_offset, PAGE_SIZE};
pub use record::{size_in_mb, Credential, MemeRecord, MemeSummary, MemeUpdate};
pub use sqlite::SqliteMetadataStore;

// =============================================================================
// MetadataStore Trait
// =============================================================================

/// Storage backend for meme metadata and credentials.
///
/// Every read path excludes soft-deleted records.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a new record stamped with the current time and return its id.
    async fn insert(&self, name: &str, extension: &str, size_mb: f64) -> Result<i64, DbError>;

    /// List one page of active records as `{id, name}` pairs.
    async fn list_page(&self, page: u32) -> Result<Vec<MemeSummary>, DbError>;

    /// List one page of active records with every column.
    async fn list_page_full(&self, page: u32) -> Result<Vec<MemeRecord>, DbError>;

    /// Count active records.
    async fn count_active(&self) -> Result<u64, DbError>;

    /// Highest valid page number (0 when there are no active records).
    async fn max_page(&self) -> Result<u32, DbError> {
        Ok(max_page_for(self.count_active().await?))
    }

    /// Look up an active record by id.
    async fn get(&self, id: i64) -> Result<Option<MemeRecord>, DbError>;

    /// Apply `changes` to an active record and refresh its update timestamp.
    ///
    /// Returns `None` if no active record has this id.
    async fn update(&self, id: i64, changes: MemeUpdate) -> Result<Option<MemeRecord>, DbError>;

    /// Stamp the delete timestamp on an active record.
    ///
    /// Returns the deleted record, or `None` if no active record has this id.
    async fn soft_delete(&self, id: i64) -> Result<Option<MemeRecord>, DbError>;

    /// Look up the credential row by name, and by hash too when one is given.
    async fn verify_credential(
        &self,
        name: &str,
        password_hash: Option<&str>,
    ) -> Result<Option<Credential>, DbError>;

    /// Insert the credential row if the table is empty.
    ///
    /// Returns `true` if a row was inserted.
    async fn seed_credential(&self, name: &str, password_hash: &str) -> Result<bool, DbError>;
}
