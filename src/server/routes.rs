//! Router configuration for Meme Host.
//!
//! This module defines the HTTP routes and applies middleware for
//! authentication, body limits and CORS.
//!
//! # Route Structure
//!
//! ```text
//! /health                 - Health check (public)
//! /memes                  - Listing or image (public)
//! /private/auth           - Login (public)
//! /private/memes          - Listing, upload, update, delete (bearer)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use meme_host::server::routes::{create_router, RouterConfig};
//! use meme_host::meme::MemeService;
//!
//! let service = MemeService::new(metadata, blobs);
//! let config = RouterConfig::new("token-secret", "password-salt")
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, TokenAuth};
use super::handlers::{
    delete_handler, health_handler, login_handler, private_memes_handler, public_memes_handler,
    update_handler, upload_handler, AppState,
};
use crate::blob::BlobStore;
use crate::config::{DEFAULT_MAX_UPLOAD_MB, DEFAULT_TOKEN_TTL};
use crate::credentials::{CredentialHasher, HASH_ITERATIONS};
use crate::meme::MemeService;
use crate::store::MetadataStore;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Secret key for signing bearer tokens
    pub token_secret: String,

    /// Bearer token lifetime
    pub token_ttl: Duration,

    /// Salt for password hashing
    pub password_salt: String,

    /// PBKDF2 rounds for password hashing
    pub hash_iterations: u32,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Request body limit in bytes
    pub max_upload_bytes: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - Tokens live for 24 hours
    /// - CORS allows any origin
    /// - Uploads are capped at 10 MB
    /// - Tracing is enabled
    pub fn new(token_secret: impl Into<String>, password_salt: impl Into<String>) -> Self {
        Self {
            token_secret: token_secret.into(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL),
            password_salt: password_salt.into(),
            hash_iterations: HASH_ITERATIONS,
            cors_origins: None, // Allow any origin by default
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            enable_tracing: true,
        }
    }

    /// Set the bearer token lifetime.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set the PBKDF2 round count.
    ///
    /// Must match the count used when the stored credential was hashed.
    pub fn with_hash_iterations(mut self, iterations: u32) -> Self {
        self.hash_iterations = iterations;
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the request body limit in bytes.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Token issuer built from this configuration.
    pub fn token_auth(&self) -> TokenAuth {
        TokenAuth::new(&self.token_secret, self.token_ttl)
    }

    /// Password hasher built from this configuration.
    pub fn hasher(&self) -> CredentialHasher {
        CredentialHasher::with_iterations(&self.password_salt, self.hash_iterations)
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Public routes (health check, listing, login)
/// - Bearer-protected routes under `/private/memes`
/// - Request body limit, CORS and request tracing (optional)
pub fn create_router<M, B>(service: MemeService<M, B>, config: RouterConfig) -> Router
where
    M: MetadataStore + 'static,
    B: BlobStore + 'static,
{
    let tokens = config.token_auth();
    let app_state = AppState::new(service, config.hasher(), tokens.clone());

    let cors = build_cors_layer(&config);

    // route_layer keeps unmatched paths at 404 rather than 401
    let protected_routes = Router::new()
        .route(
            "/memes",
            get(private_memes_handler::<M, B>)
                .post(upload_handler::<M, B>)
                .put(update_handler::<M, B>)
                .delete(delete_handler::<M, B>),
        )
        .route_layer(middleware::from_fn_with_state(tokens, auth_middleware))
        .with_state(app_state.clone());

    let private_routes = Router::new()
        .route("/auth", post(login_handler::<M, B>))
        .with_state(app_state.clone())
        .merge(protected_routes);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/memes", get(public_memes_handler::<M, B>))
        .with_state(app_state)
        .nest("/private", private_routes)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors);

    // Add tracing if enabled
    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
