//! # Meme Host
//!
//! An HTTP service for hosting meme images.
//!
//! Meme metadata (name, extension, size, timestamps) lives in SQLite; image
//! bytes live in S3-compatible object storage under `{id}.{extension}`.
//! A public surface lists memes and streams images, and a bearer-protected
//! private surface uploads, updates and soft-deletes them.
//!
//! ## Features
//!
//! - **Paginated listings**: Fixed pages of 10, out-of-range pages clamp to the last one
//! - **Streaming images**: Objects are streamed from S3 straight into the response body
//! - **Soft delete**: Deleted records stay in the table but disappear from every read path
//! - **Signed bearer tokens**: HMAC-SHA256 tokens with a configurable lifetime
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`store`] - Metadata store trait and SQLite implementation
//! - [`blob`] - Object store trait and S3 implementation
//! - [`credentials`] - Salted password hashing and admin seeding
//! - [`meme`] - Service keeping the two stores consistent
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use meme_host::{create_router, create_s3_client, MemeService, RouterConfig, S3BlobStore,
//!     SqliteMetadataStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metadata = SqliteMetadataStore::open("memes.db")?;
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let blobs = S3BlobStore::new(client, "memes".to_string());
//!
//!     let router = create_router(
//!         MemeService::new(metadata, blobs),
//!         RouterConfig::new("token-secret", "password-salt"),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod blob;
pub mod config;
pub mod credentials;
pub mod error;
pub mod meme;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use blob::{blob_key, create_s3_client, BlobObject, BlobStore, BlobStream, S3BlobStore};
pub use config::Config;
pub use credentials::{check_login, seed_admin, CredentialHasher, HASH_ITERATIONS};
pub use error::{DbError, IoError, MemeError};
pub use meme::{ImageUpload, ListPage, MemeService};
pub use server::{
    auth_middleware, create_router, health_handler, AppState, AuthError, AuthenticatedUser,
    ErrorResponse, HealthResponse, RouterConfig, TokenAuth, TokenResponse,
};
pub use store::{
    Credential, MemeRecord, MemeSummary, MemeUpdate, MetadataStore, SqliteMetadataStore, PAGE_SIZE,
};
