//! Meme service layer.
//!
//! The service owns both storage backends and keeps them consistent:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              MemeService                │
//! │   list · open_image · upload ·          │
//! │   update · delete                       │
//! └──────────┬──────────────────┬───────────┘
//!            │                  │
//!            ▼                  ▼
//! ┌────────────────────┐ ┌─────────────────┐
//! │   MetadataStore    │ │    BlobStore    │
//! │   (SQLite rows)    │ │  (S3 objects)   │
//! └────────────────────┘ └─────────────────┘
//! ```
//!
//! The two stores commit independently. Writes that touch both run as a
//! small saga: when the second step fails, the first is compensated.
//!
//! One gap remains. Replacing an image with one of the same extension writes
//! to the key the old image lives under, so the old bytes are gone before the
//! row is updated. If that row update then fails, the new image stays in
//! place next to the old name and size, and there is nothing to restore.

mod service;
mod upload;

pub use service::{ListPage, MemeService};
pub use upload::ImageUpload;
