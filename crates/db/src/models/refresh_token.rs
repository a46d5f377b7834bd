//! Refresh token model and DTOs.

use backoffice_core::refresh_token::is_active;
use backoffice_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `refresh_tokens` table.
///
/// `token_hash` is the keyed digest of the raw secret; the secret itself is
/// never stored.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: DbId,
    pub account_id: DbId,
    pub token_hash: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub revoked_by_ip: Option<String>,
    pub revocation_reason: Option<String>,
    pub created_by_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RefreshToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Not revoked and not expired as of `now`.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        is_active(self.revoked_at, self.expires_at, now)
    }
}

/// Session listing entry: a refresh token row without its digest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: DbId,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub created_by_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl From<&RefreshToken> for SessionInfo {
    fn from(token: &RefreshToken) -> Self {
        Self {
            id: token.id,
            created_at: token.created_at,
            expires_at: token.expires_at,
            created_by_ip: token.created_by_ip.clone(),
            user_agent: token.user_agent.clone(),
        }
    }
}

/// DTO for inserting a refresh token.
#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    pub account_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub created_by_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Revocation details applied to one or more rows.
#[derive(Debug, Clone)]
pub struct Revocation {
    pub revoked_by_ip: String,
    pub reason: String,
}

/// Result of a conditional single-row revoke.
#[derive(Debug, Clone)]
pub enum RevokeResult {
    /// The row was active or expired-but-unrevoked and is now revoked.
    Revoked(RefreshToken),
    /// The row was already revoked; nothing changed.
    AlreadyRevoked(RefreshToken),
    /// No row has this digest.
    NotFound,
}
