//! Configuration management for Meme Host.
//!
//! Every option can be given on the command line or through an environment
//! variable with the `MEME_` prefix:
//!
//! - `MEME_HOST` - Server bind address (default: 0.0.0.0)
//! - `MEME_PORT` - Server port (default: 8000)
//! - `MEME_DATABASE` - SQLite database path (default: memes.db)
//! - `MEME_S3_BUCKET` - S3 bucket for images (required)
//! - `MEME_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `MEME_S3_REGION` - AWS region (default: us-east-1)
//! - `MEME_AUTH_SALT` - Salt for password hashing (required)
//! - `MEME_TOKEN_SECRET` - HMAC secret for bearer tokens (required)
//! - `MEME_TOKEN_TTL` - Bearer token lifetime in seconds (default: 86400)
//! - `MEME_ADMIN_LOGIN` / `MEME_ADMIN_PASSWORD` - Seeded credential (default: madsoft)
//! - `MEME_MAX_UPLOAD_MB` - Request body limit in megabytes (default: 10)
//! - `MEME_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default SQLite database path.
pub const DEFAULT_DATABASE: &str = "memes.db";

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default bearer token lifetime in seconds (24 hours).
pub const DEFAULT_TOKEN_TTL: u64 = 86_400;

/// Longest accepted bearer token lifetime in seconds (10 years).
pub const MAX_TOKEN_TTL: u64 = 10 * 365 * 24 * 60 * 60;

/// Default admin login and password.
pub const DEFAULT_ADMIN: &str = "madsoft";

/// Default upload limit in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 10;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Meme Host - An image hosting API for memes.
///
/// Keeps meme metadata in SQLite and image bytes in S3 or S3-compatible
/// storage.
#[derive(Parser, Debug, Clone)]
#[command(name = "meme-host")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "MEME_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "MEME_PORT")]
    pub port: u16,

    /// Path to the SQLite database file. Created if missing.
    #[arg(long, default_value = DEFAULT_DATABASE, env = "MEME_DATABASE")]
    pub database: PathBuf,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// S3 bucket name holding the images.
    #[arg(long, env = "MEME_S3_BUCKET")]
    pub s3_bucket: String,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    ///
    /// If not specified, uses the default AWS S3 endpoint.
    #[arg(long, env = "MEME_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "MEME_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Salt applied to every password hash.
    #[arg(long, env = "MEME_AUTH_SALT", hide_env_values = true)]
    pub auth_salt: String,

    /// Secret key for signing bearer tokens.
    #[arg(long, env = "MEME_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: String,

    /// Bearer token lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_TOKEN_TTL, env = "MEME_TOKEN_TTL")]
    pub token_ttl: u64,

    /// Login seeded into an empty credential table.
    #[arg(long, default_value = DEFAULT_ADMIN, env = "MEME_ADMIN_LOGIN")]
    pub admin_login: String,

    /// Password seeded into an empty credential table.
    #[arg(long, default_value = DEFAULT_ADMIN, env = "MEME_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: String,

    // =========================================================================
    // Upload Configuration
    // =========================================================================
    /// Maximum request body size in megabytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB, env = "MEME_MAX_UPLOAD_MB")]
    pub max_upload_mb: usize,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "MEME_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.s3_bucket.is_empty() {
            return Err(
                "S3 bucket name is required. Set --s3-bucket or MEME_S3_BUCKET".to_string(),
            );
        }

        if self.auth_salt.is_empty() {
            return Err(
                "Password salt is required. Set --auth-salt or MEME_AUTH_SALT".to_string(),
            );
        }

        if self.token_secret.is_empty() {
            return Err(
                "Token secret is required. Set --token-secret or MEME_TOKEN_SECRET".to_string(),
            );
        }

        if self.token_ttl == 0 {
            return Err("token_ttl must be greater than 0".to_string());
        }

        if self.token_ttl > MAX_TOKEN_TTL {
            return Err(format!(
                "token_ttl must be at most {} seconds",
                MAX_TOKEN_TTL
            ));
        }

        if self.admin_login.is_empty() {
            return Err("admin_login must not be empty".to_string());
        }

        if self.max_upload_mb == 0 {
            return Err("max_upload_mb must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Bearer token lifetime.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl)
    }

    /// Request body limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

// =============================================================================
// Tests
// =============================================================================
