//! Bearer token authentication for the private API.
//!
//! A successful login returns a token bound to the username and an expiry:
//!
//! ```text
//! token     = "{username}.{expiry}.{signature}"
//! signature = hex(HMAC-SHA256(secret_key, "{username}.{expiry}"))
//! ```
//!
//! Private routes expect `Authorization: Bearer <token>`.
//!
//! # Security Properties
//!
//! - **Username binding**: the signature covers the username, so it cannot be swapped
//! - **Time-limited**: tokens expire after a configurable TTL
//! - **Constant-time comparison**: signature verification uses constant-time comparison
//!
//! # Example
//!
//! ```rust
//! use meme_host::server::auth::TokenAuth;
//! use std::time::Duration;
//!
//! let auth = TokenAuth::new("my-secret-key", Duration::from_secs(3600));
//! let (token, _expiry) = auth.issue("madsoft");
//!
//! assert_eq!(auth.verify(&token).unwrap(), "madsoft");
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::handlers::ErrorResponse;

// =============================================================================
// Types
// =============================================================================

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Authentication error types.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No Authorization header on a private route
    MissingToken,

    /// Header or token is not in the expected shape
    InvalidTokenFormat,

    /// Token has expired
    Expired {
        /// When the token expired
        expired_at: u64,
        /// Current time
        current_time: u64,
    },

    /// Token signature does not match
    InvalidToken,

    /// Login with an unknown username or wrong password
    InvalidCredentials,

    /// Credential lookup failed
    Backend(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing bearer token"),
            AuthError::InvalidTokenFormat => write!(f, "Invalid token format"),
            AuthError::Expired {
                expired_at,
                current_time,
            } => write!(
                f,
                "Token expired at {} (current time: {})",
                expired_at, current_time
            ),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::InvalidCredentials => write!(f, "Incorrect username or password"),
            AuthError::Backend(msg) => write!(f, "Credential store error: {}", msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "missing_token", self.to_string()),
            AuthError::InvalidTokenFormat => (
                StatusCode::UNAUTHORIZED,
                "invalid_token_format",
                self.to_string(),
            ),
            AuthError::Expired { .. } => {
                (StatusCode::UNAUTHORIZED, "token_expired", self.to_string())
            }
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", self.to_string()),
            AuthError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                "invalid_credentials",
                self.to_string(),
            ),
            AuthError::Backend(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                self.to_string(),
            ),
        };

        // Forged tokens and failed logins may be probing, so log them at warn
        match &self {
            AuthError::InvalidToken | AuthError::InvalidCredentials => {
                warn!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    message
                );
            }
            AuthError::Backend(_) => {
                tracing::error!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    message
                );
            }
            _ => {
                debug!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    message
                );
            }
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        let mut response = (status, Json(error_response)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

// =============================================================================
// Token Authentication
// =============================================================================

/// Issues and verifies HMAC-SHA256 signed bearer tokens.
#[derive(Clone)]
pub struct TokenAuth {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,

    /// How long issued tokens stay valid
    ttl: Duration,
}

impl TokenAuth {
    /// Create a new authenticator with the given secret key and token lifetime.
    pub fn new(secret_key: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
            ttl,
        }
    }

    /// Lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `username`.
    ///
    /// Returns the token and its expiry timestamp (Unix epoch seconds).
    pub fn issue(&self, username: &str) -> (String, u64) {
        let expiry = unix_now().saturating_add(self.ttl.as_secs());
        (self.issue_with_expiry(username, expiry), expiry)
    }

    /// Issue a token with a specific expiry timestamp.
    pub fn issue_with_expiry(&self, username: &str, expiry: u64) -> String {
        let signature = self.compute_signature(username, expiry);
        format!("{}.{}.{}", username, expiry, signature)
    }

    /// Verify a token and return the username it was issued to.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        // Split from the right: usernames may contain dots
        let mut parts = token.rsplitn(3, '.');
        let signature = parts.next().ok_or(AuthError::InvalidTokenFormat)?;
        let expiry = parts.next().ok_or(AuthError::InvalidTokenFormat)?;
        let username = parts.next().ok_or(AuthError::InvalidTokenFormat)?;

        if username.is_empty() {
            return Err(AuthError::InvalidTokenFormat);
        }

        let expiry: u64 = expiry
            .parse()
            .map_err(|_| AuthError::InvalidTokenFormat)?;

        // Check expiry first
        let current_time = unix_now();
        if current_time > expiry {
            return Err(AuthError::Expired {
                expired_at: expiry,
                current_time,
            });
        }

        let provided_sig = hex::decode(signature).map_err(|_| AuthError::InvalidTokenFormat)?;
        let expected_sig = self.raw_signature(username, expiry);

        if provided_sig.ct_eq(&expected_sig).into() {
            Ok(username.to_string())
        } else {
            Err(AuthError::InvalidToken)
        }
    }

    fn raw_signature(&self, username: &str, expiry: u64) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(format!("{}.{}", username, expiry).as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    fn compute_signature(&self, username: &str, expiry: u64) -> String {
        hex::encode(self.raw_signature(username, expiry))
    }
}

impl std::fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuth")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// The user a verified bearer token was issued to.
///
/// Inserted into request extensions by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Axum middleware that requires a valid bearer token.
///
/// Rejects the request with 401 when the token is missing, malformed,
/// expired, or forged.
pub async fn auth_middleware(
    State(auth): State<TokenAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let username = {
        let value = request
            .headers()
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidTokenFormat)?;

        let token = bearer_token(value).ok_or(AuthError::InvalidTokenFormat)?;
        auth.verify(token)?
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser { username });

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// =============================================================================
// Tests
// =============================================================================
