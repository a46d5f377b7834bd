//! Password hashing and verification.
//!
//! New hashes are Argon2id PHC strings with a random salt from [`OsRng`].
//! Accounts migrated from the legacy system still carry bcrypt hashes
//! (`$2a$`, `$2b$`, `$2y$`); those are verified with the `bcrypt` crate until
//! the password is next changed. Both paths use the algorithm's own compare.

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

const BCRYPT_PREFIXES: [&str; 4] = ["$2a$", "$2b$", "$2x$", "$2y$"];

/// A stored hash that could not be used for verification.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("argon2 hash error: {0}")]
    Argon2(argon2::password_hash::Error),

    #[error("bcrypt hash error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

/// Hash a plaintext password using Argon2id with a random salt.
///
/// Returns the PHC-formatted hash string (includes algorithm, params, salt, and hash).
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError::Argon2)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored Argon2 or bcrypt hash.
///
/// Returns `Ok(true)` if the password matches, `Ok(false)` if it does not,
/// and `Err` only when the stored hash itself is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    if is_bcrypt_hash(hash) {
        return Ok(bcrypt::verify(password, hash)?);
    }

    let parsed_hash = PasswordHash::new(hash).map_err(PasswordError::Argon2)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Argon2(e)),
    }
}

/// Spend the same work as a real verification without a real account.
///
/// Called for unknown usernames so response timing does not reveal whether
/// the username exists.
pub fn verify_against_dummy(password: &str) {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    let hash = DUMMY_HASH.get_or_init(|| {
        hash_password("dummy-password-for-timing").unwrap_or_default()
    });
    let _ = verify_password(password, hash);
}

fn is_bcrypt_hash(hash: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|prefix| hash.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");

        assert!(
            hash.starts_with("$argon2id$"),
            "expected argon2id PHC prefix"
        );
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_wrong_password_fails() {
        let hash = hash_password("real-password").expect("hashing should succeed");
        let verified = verify_password("wrong-password", &hash).expect("verify should succeed");
        assert!(!verified, "wrong password should verify as false");
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let a = hash_password("repeat-me").unwrap();
        let b = hash_password("repeat-me").unwrap();
        assert_ne!(a, b, "salts must differ");
    }

    #[test]
    fn test_legacy_bcrypt_hash_verifies() {
        let legacy = bcrypt::hash("legacy-pass", 4).expect("bcrypt hashing should succeed");
        assert!(verify_password("legacy-pass", &legacy).unwrap());
        assert!(!verify_password("other-pass", &legacy).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-hash").is_err());
        assert!(verify_password("anything", "").is_err());
    }

    #[test]
    fn test_dummy_verification_does_not_panic() {
        verify_against_dummy("whatever");
    }
}
