//! Refresh-token secret generation and lookup-key derivation.
//!
//! A refresh secret is 64 bytes from a CSPRNG, URL-safe base64 encoded. It is
//! handed to the client once. The database only ever sees its digest,
//! `HMAC-SHA256(digest_key, secret)`, which is deterministic so the row can
//! be found again from the raw secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;

use crate::hashing;
use crate::types::Timestamp;

/// Number of random bytes in a refresh secret (512 bits).
pub const SECRET_BYTES: usize = 64;

/// Default refresh token lifetime in days.
pub const DEFAULT_LIFETIME_DAYS: i64 = 7;

/// Revocation reason used when a caller does not supply one.
pub const REASON_REVOKED: &str = "Revoked";

/// Revocation reason for bulk revocation of an account's tokens.
pub const REASON_SYSTEM_REVOKE: &str = "System revoke";

/// Revocation reason recorded on the old token during rotation.
pub const REASON_REPLACED: &str = "Replaced by new token";

/// Revocation reason recorded when the owner logs out.
pub const REASON_LOGOUT: &str = "Logout";

/// A freshly generated refresh secret together with its storage digest.
pub struct GeneratedRefreshSecret {
    /// Raw secret, returned to the caller once and never persisted.
    pub secret: String,
    /// Digest persisted in `refresh_tokens.token_hash`.
    pub digest: String,
}

/// Generate a new refresh secret and its digest under `digest_key`.
pub fn generate_refresh_secret(digest_key: &[u8]) -> GeneratedRefreshSecret {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let secret = URL_SAFE_NO_PAD.encode(bytes);
    let digest = refresh_secret_digest(digest_key, &secret);
    GeneratedRefreshSecret { secret, digest }
}

/// Derive the lookup key for a raw refresh secret.
pub fn refresh_secret_digest(digest_key: &[u8], secret: &str) -> String {
    hashing::hmac_sha256_hex(digest_key, secret.as_bytes())
}

/// The active-token invariant: not revoked and not yet expired.
pub fn is_active(revoked_at: Option<Timestamp>, expires_at: Timestamp, now: Timestamp) -> bool {
    revoked_at.is_none() && now < expires_at
}
