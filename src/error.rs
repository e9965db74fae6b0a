use thiserror::Error;

/// I/O errors that can occur when talking to the object store
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Errors raised by the relational metadata store
#[derive(Debug, Clone, Error)]
pub enum DbError {
    /// Error reported by SQLite
    #[error("SQLite error: {0}")]
    Sqlite(String),

    /// The blocking task running the query panicked or was cancelled
    #[error("Database task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        DbError::Sqlite(err.to_string())
    }
}

impl From<tokio::task::JoinError> for DbError {
    fn from(err: tokio::task::JoinError) -> Self {
        DbError::Task(err.to_string())
    }
}

/// Errors that can occur while serving meme requests
#[derive(Debug, Clone, Error)]
pub enum MemeError {
    /// No active meme with this id
    #[error("Meme not found: {id}")]
    NotFound { id: i64 },

    /// Uploaded part is not an image (should map to HTTP 422)
    #[error("Unsupported media type: {content_type} (only image/* uploads are accepted)")]
    UnsupportedMediaType { content_type: String },

    /// A required request field is absent
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Request body could not be interpreted
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request body exceeds the configured upload limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Metadata store failure
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Object store failure
    #[error("Storage error: {0}")]
    Storage(#[from] IoError),
}
