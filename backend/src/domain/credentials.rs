//! Credential store: one-way password hashing and verification.
//!
//! Hashes are Argon2id PHC strings with a random salt per call. Hashing is
//! CPU-bound, so the async entry points move the work onto the blocking pool.

use std::fmt;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash as PhcString, PasswordHasher, PasswordVerifier, SaltString,
};
use zeroize::Zeroizing;

/// Failures raised while hashing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The hashing primitive rejected its input.
    #[error("password hashing failed: {message}")]
    Hashing {
        /// Description from the hashing library.
        message: String,
    },
    /// The blocking task did not complete.
    #[error("password hashing task failed: {message}")]
    Task {
        /// Join failure description.
        message: String,
    },
}

/// Stored credential in PHC string format.
///
/// `Debug` is redacted so hashes never reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a PHC string read from storage.
    #[must_use]
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// PHC string to persist.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Derive a salted Argon2id hash of `plaintext`.
///
/// # Examples
/// ```
/// use tsuki::domain::credentials::{hash_password, verify_password};
///
/// let hash = hash_password("correct horse").expect("hashing succeeds");
/// assert!(verify_password("correct horse", &hash));
/// assert!(!verify_password("battery staple", &hash));
/// ```
pub fn hash_password(plaintext: &str) -> Result<PasswordHash, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|phc| PasswordHash(phc.to_string()))
        .map_err(|err| CredentialError::Hashing {
            message: err.to_string(),
        })
}

/// Check `plaintext` against a stored hash.
///
/// A stored value that is not a parsable PHC string never verifies.
#[must_use]
pub fn verify_password(plaintext: &str, stored: &PasswordHash) -> bool {
    let Ok(parsed) = PhcString::new(stored.as_str()) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Async facade running the hashing primitives on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct CredentialStore;

impl CredentialStore {
    /// Hash a password without stalling the async workers.
    pub async fn hash(&self, plaintext: &str) -> Result<PasswordHash, CredentialError> {
        let owned = Zeroizing::new(plaintext.to_owned());
        tokio::task::spawn_blocking(move || hash_password(owned.as_str()))
            .await
            .map_err(|err| CredentialError::Task {
                message: err.to_string(),
            })?
    }

    /// Verify a password without stalling the async workers.
    ///
    /// A failed blocking task counts as a mismatch.
    pub async fn verify(&self, plaintext: &str, stored: &PasswordHash) -> bool {
        let owned = Zeroizing::new(plaintext.to_owned());
        let stored = stored.clone();
        tokio::task::spawn_blocking(move || verify_password(owned.as_str(), &stored))
            .await
            .unwrap_or_else(|err| {
                tracing::error!(error = %err, "password verification task failed");
                false
            })
    }
}
