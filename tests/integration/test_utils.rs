//! Test utilities for integration tests.
//!
//! This module provides an in-memory blob store, a router harness wired to an
//! in-memory SQLite database, and helpers for building multipart and
//! form-encoded requests.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use bytes::Bytes;
use futures::stream;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower::ServiceExt;

use meme_host::error::IoError;
use meme_host::{
    create_router, seed_admin, BlobObject, BlobStore, MemeService, RouterConfig,
    SqliteMetadataStore,
};

pub const TEST_SECRET: &str = "test-secret-key-for-hmac-signing";
pub const TEST_SALT: &str = "test-salt";
pub const ADMIN_LOGIN: &str = "madsoft";
pub const ADMIN_PASSWORD: &str = "madsoft";

// =============================================================================
// In-memory Blob Store
// =============================================================================

/// A blob store that keeps objects in a shared map.
///
/// Clones share the same map, so a test can keep a handle and inspect what
/// the router wrote.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, (Bytes, String)>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn object(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.read().await.get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), IoError> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<BlobObject, IoError> {
        let (data, _) = self
            .object(key)
            .await
            .ok_or_else(|| IoError::NotFound(key.to_string()))?;

        Ok(BlobObject {
            content_length: Some(data.len() as u64),
            stream: Box::pin(stream::once(async move { Ok::<_, IoError>(data) })),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), IoError> {
        self.objects
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| IoError::NotFound(key.to_string()))
    }
}

// =============================================================================
// Router Harness
// =============================================================================

pub type TestService = MemeService<SqliteMetadataStore, MemoryBlobStore>;

/// A router over an in-memory database with the admin credential seeded.
pub struct TestApp {
    pub router: Router,
    pub service: TestService,
    pub blobs: MemoryBlobStore,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_router_config()).await
    }

    pub async fn with_config(config: RouterConfig) -> Self {
        let metadata = SqliteMetadataStore::open_in_memory().unwrap();
        seed_admin(&metadata, &config.hasher(), ADMIN_LOGIN, ADMIN_PASSWORD)
            .await
            .unwrap();

        let blobs = MemoryBlobStore::new();
        let service = MemeService::new(metadata, blobs.clone());
        let router = create_router(service.clone(), config);

        Self {
            router,
            service,
            blobs,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Log in as the seeded admin and return the access token.
    pub async fn login(&self) -> String {
        let response = self.send(login_request(ADMIN_LOGIN, ADMIN_PASSWORD)).await;
        assert_eq!(response.status(), 200);
        let json = body_json(response).await;
        json["access_token"].as_str().unwrap().to_string()
    }

    /// Upload an image through the private API and return the new id.
    pub async fn upload(&self, token: &str, name: &str, content_type: &str, data: &[u8]) -> i64 {
        let request = multipart_request(
            Method::POST,
            "/private/memes",
            Some(token),
            &[
                Part::text("text", name),
                Part::file("image", "upload", content_type, data),
            ],
        );
        let response = self.send(request).await;
        assert_eq!(response.status(), 200);
        body_json(response).await["id"].as_i64().unwrap()
    }
}

/// Router config with fast hashing and no tracing.
pub fn test_router_config() -> RouterConfig {
    RouterConfig::new(TEST_SECRET, TEST_SALT)
        .with_token_ttl(Duration::from_secs(3600))
        .with_hash_iterations(1)
        .with_tracing(false)
}

// =============================================================================
// Request Builders
// =============================================================================

pub const BOUNDARY: &str = "meme-host-test-boundary";

/// One part of a multipart body.
pub struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    content_type: Option<&'a str>,
    data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            filename: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }

    pub fn file(name: &'a str, filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            filename: Some(filename),
            content_type: Some(content_type),
            data,
        }
    }
}

/// Encode parts as a `multipart/form-data` body delimited by [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    parts: &[Part<'_>],
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/private/auth")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "username={}&password={}",
            username, password
        )))
        .unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    authorized(Method::GET, uri, token)
}

pub fn authorized(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

// =============================================================================
// Response Helpers
// =============================================================================

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Deterministic fake image bytes of the given length.
pub fn fake_image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
