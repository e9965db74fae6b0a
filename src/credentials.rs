//! Salted password hashing for the admin credential.
//!
//! Passwords are stored as hex-encoded PBKDF2-HMAC-SHA256 output:
//!
//! ```text
//! hash = hex(PBKDF2-HMAC-SHA256(password, salt, 100_000 rounds, 32 bytes))
//! ```
//!
//! The salt is per deployment. There is a single credential row; it is
//! seeded at startup when the table is empty.

use sha2::Sha256;
use tracing::{debug, info};

use crate::error::DbError;
use crate::store::{Credential, MetadataStore};

/// PBKDF2 round count.
pub const HASH_ITERATIONS: u32 = 100_000;

/// Length of the derived key in bytes.
const HASH_LEN: usize = 32;

/// Hashes and verifies passwords with a fixed salt and round count.
#[derive(Clone)]
pub struct CredentialHasher {
    salt: Vec<u8>,
    iterations: u32,
}

impl CredentialHasher {
    /// Create a hasher with the default round count.
    pub fn new(salt: impl AsRef<[u8]>) -> Self {
        Self::with_iterations(salt, HASH_ITERATIONS)
    }

    /// Create a hasher with a custom round count.
    ///
    /// Lower counts are only useful to keep tests fast.
    pub fn with_iterations(salt: impl AsRef<[u8]>, iterations: u32) -> Self {
        Self {
            salt: salt.as_ref().to_vec(),
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash a password, returning lowercase hex.
    pub fn hash(&self, password: &str) -> String {
        let mut out = [0u8; HASH_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &self.salt, self.iterations, &mut out);
        hex::encode(out)
    }

    /// Hash a password on the blocking pool.
    ///
    /// A full-strength hash takes long enough to stall an async worker.
    pub async fn hash_blocking(&self, password: &str) -> Result<String, DbError> {
        let hasher = self.clone();
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await?;
        Ok(hash)
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

/// Insert the admin credential if none exists yet.
///
/// Safe to call on every startup: a populated table is left untouched.
pub async fn seed_admin<M: MetadataStore + ?Sized>(
    store: &M,
    hasher: &CredentialHasher,
    login: &str,
    password: &str,
) -> Result<bool, DbError> {
    let hash = hasher.hash_blocking(password).await?;
    let inserted = store.seed_credential(login, &hash).await?;
    if inserted {
        info!(login, "Seeded admin credential");
    } else {
        debug!("Admin credential already present");
    }
    Ok(inserted)
}

/// Look up the credential matching `login` and `password`.
pub async fn check_login<M: MetadataStore + ?Sized>(
    store: &M,
    hasher: &CredentialHasher,
    login: &str,
    password: &str,
) -> Result<Option<Credential>, DbError> {
    let hash = hasher.hash_blocking(password).await?;
    store.verify_credential(login, Some(&hash)).await
}

// =============================================================================
// Tests
// =============================================================================
