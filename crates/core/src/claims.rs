//! Typed access-token claims.
//!
//! The claim set is a fixed struct rather than a bag of string pairs, so a
//! missing claim is a compile error instead of a runtime lookup miss. The
//! `ver` field versions the serialized shape; bump [`CLAIMS_VERSION`] when a
//! field is added, renamed, or changes meaning.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{DbId, Timestamp};

/// Current claim schema version written into every token.
pub const CLAIMS_VERSION: u16 = 1;

/// The account facts an access token asserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountIdentity {
    pub account_id: DbId,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub role_id: DbId,
    pub role_name: String,
}

impl AccountIdentity {
    /// `"{first} {last}"` with missing parts as empty strings, untrimmed.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
    }

    /// Display name with surrounding whitespace removed.
    pub fn full_name(&self) -> String {
        self.display_name().trim().to_string()
    }
}

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the account id as a decimal string.
    pub sub: String,
    /// Username.
    pub name: String,
    /// Email, empty when the account has none.
    pub email: String,
    /// First and last name separated by a space.
    pub given_name: String,
    /// Role name.
    pub role: String,
    pub role_id: DbId,
    pub account_id: DbId,
    /// `"true"` or `"false"`.
    pub is_active: String,
    pub full_name: String,
    pub iss: String,
    pub aud: String,
    /// Issued-at (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration (UTC Unix timestamp).
    pub exp: i64,
    /// Unique token identifier.
    pub jti: String,
    /// Claim schema version.
    pub ver: u16,
}

impl AccessClaims {
    /// Build the claim set for `identity`, valid from `issued_at` until
    /// `expires_at`.
    pub fn new(
        identity: &AccountIdentity,
        issuer: &str,
        audience: &str,
        issued_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            sub: identity.account_id.to_string(),
            name: identity.username.clone(),
            email: identity.email.clone().unwrap_or_default(),
            given_name: identity.display_name(),
            role: identity.role_name.clone(),
            role_id: identity.role_id,
            account_id: identity.account_id,
            is_active: identity.is_active.to_string(),
            full_name: identity.full_name(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            ver: CLAIMS_VERSION,
        }
    }

    /// Whether this token was written with a claim schema this build reads.
    pub fn is_supported_version(&self) -> bool {
        self.ver == CLAIMS_VERSION
    }
}
