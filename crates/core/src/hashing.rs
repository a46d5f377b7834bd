//! Shared digest utilities.
//!
//! Fast, deterministic hashes only. Passwords never go through this module;
//! they use the adaptive hashers in `backoffice_api::auth::password`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute an HMAC-SHA256 of `data` under `key`, hex-encoded.
///
/// The same `(key, data)` pair always produces the same output, which is what
/// makes it usable as a lookup key.
pub fn hmac_sha256_hex(key: &[u8], data: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    format!("{:x}", mac.finalize().into_bytes())
}
