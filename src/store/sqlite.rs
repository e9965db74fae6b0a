//! SQLite-backed metadata store.
//!
//! A single long-lived connection is shared behind a mutex. Queries run on
//! tokio's blocking pool so handlers never stall the async runtime.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::DbError;

use super::page::{page_offset, PAGE_SIZE};
use super::record::{Credential, MemeRecord, MemeSummary, MemeUpdate};
use super::MetadataStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS info (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        extension TEXT NOT NULL,
        size_mb REAL NOT NULL,
        create_date TEXT NOT NULL,
        update_date TEXT,
        delete_date TEXT
    );

    CREATE TABLE IF NOT EXISTS oauth (
        name TEXT PRIMARY KEY,
        password TEXT NOT NULL
    );
";

const RECORD_COLUMNS: &str =
    "id, name, extension, size_mb, create_date, update_date, delete_date";

/// Metadata store over one SQLite connection.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMetadataStore {
    /// Open (or create) the database file at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database. Data is lost when the store is dropped.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await?;

        result.map_err(DbError::from)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MemeRecord> {
    Ok(MemeRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        extension: row.get("extension")?,
        size_mb: row.get("size_mb")?,
        create_date: row.get("create_date")?,
        update_date: row.get("update_date")?,
        delete_date: row.get("delete_date")?,
    })
}

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<Credential> {
    Ok(Credential {
        name: row.get(0)?,
        password_hash: row.get(1)?,
    })
}

fn select_active(conn: &Connection, id: i64) -> rusqlite::Result<Option<MemeRecord>> {
    conn.query_row(
        &format!("SELECT {RECORD_COLUMNS} FROM info WHERE id = ?1 AND delete_date IS NULL"),
        params![id],
        record_from_row,
    )
    .optional()
}

fn limit_offset(page: u32) -> (i64, i64) {
    let offset = i64::try_from(page_offset(page)).unwrap_or(i64::MAX);
    (i64::from(PAGE_SIZE), offset)
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn insert(&self, name: &str, extension: &str, size_mb: f64) -> Result<i64, DbError> {
        let name = name.to_string();
        let extension = extension.to_string();

        let id = self
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO info (name, extension, size_mb, create_date) VALUES (?1, ?2, ?3, ?4)",
                    params![name, extension, size_mb, Utc::now()],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        debug!(id, "Inserted meme record");
        Ok(id)
    }

    async fn list_page(&self, page: u32) -> Result<Vec<MemeSummary>, DbError> {
        let (limit, offset) = limit_offset(page);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name FROM info WHERE delete_date IS NULL
                 ORDER BY id LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt.query_map(params![limit, offset], |row| {
                Ok(MemeSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?;
            rows.collect()
        })
        .await
    }

    async fn list_page_full(&self, page: u32) -> Result<Vec<MemeRecord>, DbError> {
        let (limit, offset) = limit_offset(page);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM info WHERE delete_date IS NULL
                 ORDER BY id LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt.query_map(params![limit, offset], record_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn count_active(&self) -> Result<u64, DbError> {
        let count: i64 = self
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM info WHERE delete_date IS NULL",
                    [],
                    |row| row.get(0),
                )
            })
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn get(&self, id: i64) -> Result<Option<MemeRecord>, DbError> {
        self.with_conn(move |conn| select_active(conn, id)).await
    }

    async fn update(&self, id: i64, changes: MemeUpdate) -> Result<Option<MemeRecord>, DbError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let updated = tx.execute(
                "UPDATE info
                 SET name = COALESCE(?1, name),
                     extension = COALESCE(?2, extension),
                     size_mb = COALESCE(?3, size_mb),
                     update_date = ?4
                 WHERE id = ?5 AND delete_date IS NULL",
                params![
                    changes.name,
                    changes.extension,
                    changes.size_mb,
                    Utc::now(),
                    id
                ],
            )?;
            if updated == 0 {
                return Ok(None);
            }
            let record = select_active(&tx, id)?;
            tx.commit()?;
            Ok(record)
        })
        .await
    }

    async fn soft_delete(&self, id: i64) -> Result<Option<MemeRecord>, DbError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let updated = tx.execute(
                "UPDATE info SET delete_date = ?1 WHERE id = ?2 AND delete_date IS NULL",
                params![Utc::now(), id],
            )?;
            if updated == 0 {
                return Ok(None);
            }
            let record = tx
                .query_row(
                    &format!("SELECT {RECORD_COLUMNS} FROM info WHERE id = ?1"),
                    params![id],
                    record_from_row,
                )
                .optional()?;
            tx.commit()?;
            Ok(record)
        })
        .await
    }

    async fn verify_credential(
        &self,
        name: &str,
        password_hash: Option<&str>,
    ) -> Result<Option<Credential>, DbError> {
        let name = name.to_string();
        let password_hash = password_hash.map(str::to_string);

        self.with_conn(move |conn| {
            match password_hash {
                Some(hash) => conn
                    .query_row(
                        "SELECT name, password FROM oauth WHERE name = ?1 AND password = ?2",
                        params![name, hash],
                        credential_from_row,
                    )
                    .optional(),
                None => conn
                    .query_row(
                        "SELECT name, password FROM oauth WHERE name = ?1",
                        params![name],
                        credential_from_row,
                    )
                    .optional(),
            }
        })
        .await
    }

    async fn seed_credential(&self, name: &str, password_hash: &str) -> Result<bool, DbError> {
        let name = name.to_string();
        let password_hash = password_hash.to_string();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let existing: i64 = tx.query_row("SELECT COUNT(*) FROM oauth", [], |row| row.get(0))?;
            if existing > 0 {
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO oauth (name, password) VALUES (?1, ?2)",
                params![name, password_hash],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================
