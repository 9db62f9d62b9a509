//! Edit key issuing and verification.
//!
//! An edit key is the only credential in the system. It is generated when a
//! store or review is created, handed to the creator once, and only its
//! SHA-256 digest is stored:
//!
//! 1. `issue_key` draws 16 random bytes and hex-encodes them (32 characters)
//! 2. The digest is `hex(sha256(plaintext))`, 64 lowercase hex characters
//! 3. `verify` recomputes the digest of a supplied key and compares it to the
//!    stored one in constant time
//!
//! Plaintext keys must never be logged or persisted.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Random bytes per key.
const KEY_BYTES: usize = 16;

/// A freshly issued key. `plaintext` goes to the client, `digest` to the database.
pub struct IssuedKey {
    pub plaintext: String,
    pub digest: String,
}

// Manual impl so the plaintext never ends up in a log line via `{:?}`.
impl std::fmt::Debug for IssuedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedKey")
            .field("plaintext", &"<redacted>")
            .field("digest", &self.digest)
            .finish()
    }
}

/// Generate a new edit key and its digest.
///
/// Panics if the operating system RNG is unavailable.
pub fn issue_key() -> IssuedKey {
    let bytes: [u8; KEY_BYTES] = rand::random();
    let plaintext = hex::encode(bytes);
    let digest = digest(&plaintext);

    IssuedKey { plaintext, digest }
}

/// Hex-encoded SHA-256 of a plaintext key.
pub fn digest(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());

    hex::encode(hasher.finalize())
}

/// Check a plaintext key against a stored digest.
pub fn verify(supplied: &str, stored_digest: &str) -> bool {
    digest(supplied)
        .as_bytes()
        .ct_eq(stored_digest.as_bytes())
        .into()
}

/// Gate-facing check: distinguishes a missing key from a wrong one.
///
/// # Errors
///
/// - `KeyRequired` if `supplied` is `None` or empty
/// - `InvalidKey` if the digest does not match
pub fn check(supplied: Option<&str>, stored_digest: &str) -> Result<(), AppError> {
    let supplied = supplied
        .filter(|key| !key.is_empty())
        .ok_or(AppError::KeyRequired)?;

    if verify(supplied, stored_digest) {
        Ok(())
    } else {
        Err(AppError::InvalidKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_key_shape() {
        let key = issue_key();
        assert_eq!(key.plaintext.len(), KEY_BYTES * 2);
        assert_eq!(key.digest.len(), 64);
        assert!(key.plaintext.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key.plaintext, key.digest);
    }

    #[test]
    fn digest_matches_known_sha256() {
        assert_eq!(
            digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn verify_accepts_only_the_exact_plaintext() {
        let key = issue_key();
        assert!(verify(&key.plaintext, &key.digest));
        assert!(!verify(&key.plaintext.to_uppercase(), &key.digest));
        assert!(!verify(&key.plaintext[1..], &key.digest));
        assert!(!verify("", &key.digest));
        assert!(!verify(&key.digest, &key.digest));
    }

    #[test]
    fn keys_are_unique() {
        let a = issue_key();
        let b = issue_key();
        assert_ne!(a.plaintext, b.plaintext);
        assert!(!verify(&a.plaintext, &b.digest));
    }

    #[test]
    fn check_separates_missing_from_invalid() {
        let key = issue_key();
        assert!(matches!(check(None, &key.digest), Err(AppError::KeyRequired)));
        assert!(matches!(check(Some(""), &key.digest), Err(AppError::KeyRequired)));
        assert!(matches!(
            check(Some("deadbeef"), &key.digest),
            Err(AppError::InvalidKey)
        ));
        assert!(check(Some(&key.plaintext), &key.digest).is_ok());
    }

    #[test]
    fn debug_output_redacts_plaintext() {
        let key = issue_key();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains(&key.plaintext));
    }
}
