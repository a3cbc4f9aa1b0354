//! Key fingerprinting for operational visibility.
//!
//! Operators compare fingerprints to confirm which session key or token
//! secret a running instance uses. Only a truncated SHA-256 digest is ever
//! logged, never the key material.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

/// Length of the fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Truncated SHA-256 fingerprint of arbitrary secret bytes.
///
/// # Examples
///
/// ```rust
/// use tsuki::inbound::http::session_config::fingerprint::secret_fingerprint;
///
/// let fp = secret_fingerprint(b"token secret");
/// assert_eq!(fp.len(), 16);
/// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn secret_fingerprint(secret: &[u8]) -> String {
    let digest = Sha256::digest(secret);
    hex::encode(digest.get(..FINGERPRINT_BYTES).unwrap_or_default())
}

/// Fingerprint of the cookie session key's signing half.
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    secret_fingerprint(key.signing())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn fingerprint_is_deterministic() {
        let key = Key::derive_from(&[b'a'; 64]);
        assert_eq!(key_fingerprint(&key), key_fingerprint(&key));
    }

    #[rstest]
    fn fingerprint_is_short_lowercase_hex() {
        let fp = key_fingerprint(&Key::generate());
        assert_eq!(fp.len(), FINGERPRINT_BYTES * 2);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, fp.to_lowercase());
    }

    #[rstest]
    fn different_secrets_produce_different_fingerprints() {
        assert_ne!(secret_fingerprint(b"one"), secret_fingerprint(b"two"));
    }
}
