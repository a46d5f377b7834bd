//! Refresh token lifecycle.
//!
//! Raw secrets leave this module exactly once, at issuance. Everything the
//! store sees is the keyed digest from
//! [`refresh_secret_digest`](backoffice_core::refresh_token::refresh_secret_digest).

use std::sync::Arc;

use backoffice_core::error::CoreError;
use backoffice_core::refresh_token::{
    generate_refresh_secret, refresh_secret_digest, REASON_REPLACED, REASON_REVOKED,
    REASON_SYSTEM_REVOKE,
};
use backoffice_core::types::DbId;
use backoffice_db::models::refresh_token::{
    CreateRefreshToken, RefreshToken, Revocation, RevokeResult,
};
use backoffice_db::store::RefreshTokenRepository;
use chrono::{Duration, Utc};

use crate::error::AppResult;

/// Result of revoking a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    Revoked,
    /// The token was already revoked; nothing changed.
    AlreadyRevoked,
}

/// A successful rotation: the old secret is dead, `secret` replaces it.
#[derive(Debug, Clone)]
pub struct Rotation {
    pub account_id: DbId,
    pub secret: String,
}

/// Issues, validates, rotates, and revokes refresh tokens.
pub struct RefreshTokenStore {
    tokens: Arc<dyn RefreshTokenRepository>,
    digest_key: Vec<u8>,
    lifetime: Duration,
}

impl RefreshTokenStore {
    pub fn new(
        tokens: Arc<dyn RefreshTokenRepository>,
        digest_key: &str,
        lifetime_days: i64,
    ) -> Self {
        Self {
            tokens,
            digest_key: digest_key.as_bytes().to_vec(),
            lifetime: Duration::days(lifetime_days),
        }
    }

    fn digest(&self, raw_secret: &str) -> String {
        refresh_secret_digest(&self.digest_key, raw_secret)
    }

    /// Create a token for `account_id` and return its raw secret.
    pub async fn issue(
        &self,
        account_id: DbId,
        created_by_ip: &str,
        user_agent: Option<&str>,
    ) -> AppResult<String> {
        let generated = generate_refresh_secret(&self.digest_key);
        let input = CreateRefreshToken {
            account_id,
            token_hash: generated.digest,
            expires_at: Utc::now() + self.lifetime,
            created_by_ip: Some(created_by_ip.to_string()),
            user_agent: user_agent.map(str::to_string),
        };
        let row = self.tokens.insert_refresh_token(&input).await?;
        tracing::debug!(account_id, token_id = row.id, "Refresh token issued");
        Ok(generated.secret)
    }

    /// Look up the row for a raw secret in any state.
    pub async fn find(&self, raw_secret: &str) -> AppResult<Option<RefreshToken>> {
        if raw_secret.is_empty() {
            return Ok(None);
        }
        Ok(self.tokens.find_refresh_token(&self.digest(raw_secret)).await?)
    }

    /// Look up the row for a raw secret only if it is currently active.
    pub async fn find_active(&self, raw_secret: &str) -> AppResult<Option<RefreshToken>> {
        let now = Utc::now();
        Ok(self
            .find(raw_secret)
            .await?
            .filter(|token| token.is_active_at(now)))
    }

    /// Whether `raw_secret` names an active token.
    pub async fn validate(&self, raw_secret: &str) -> AppResult<bool> {
        Ok(self.find_active(raw_secret).await?.is_some())
    }

    /// Revoke one token. Revoking an already-revoked token is a no-op.
    pub async fn revoke(
        &self,
        raw_secret: &str,
        revoked_by_ip: &str,
        reason: Option<&str>,
    ) -> AppResult<RevokeOutcome> {
        if raw_secret.is_empty() {
            return Err(CoreError::TokenNotFound.into());
        }
        let revocation = Revocation {
            revoked_by_ip: revoked_by_ip.to_string(),
            reason: reason.unwrap_or(REASON_REVOKED).to_string(),
        };
        match self
            .tokens
            .revoke_refresh_token(&self.digest(raw_secret), &revocation)
            .await?
        {
            RevokeResult::Revoked(token) => {
                tracing::info!(
                    account_id = token.account_id,
                    token_id = token.id,
                    reason = %revocation.reason,
                    "Refresh token revoked"
                );
                Ok(RevokeOutcome::Revoked)
            }
            RevokeResult::AlreadyRevoked(_) => Ok(RevokeOutcome::AlreadyRevoked),
            RevokeResult::NotFound => Err(CoreError::TokenNotFound.into()),
        }
    }

    /// Revoke every active token for an account. Returns the count revoked.
    pub async fn revoke_all_for_account(
        &self,
        account_id: DbId,
        revoked_by_ip: &str,
        reason: Option<&str>,
    ) -> AppResult<u64> {
        let revocation = Revocation {
            revoked_by_ip: revoked_by_ip.to_string(),
            reason: reason.unwrap_or(REASON_SYSTEM_REVOKE).to_string(),
        };
        let revoked = self
            .tokens
            .revoke_account_refresh_tokens(account_id, &revocation)
            .await?;
        tracing::info!(account_id, revoked, reason = %revocation.reason, "Revoked account refresh tokens");
        Ok(revoked)
    }

    pub async fn active_count_for_account(&self, account_id: DbId) -> AppResult<i64> {
        Ok(self.tokens.count_active_refresh_tokens(account_id).await?)
    }

    /// Active tokens for an account, newest first.
    pub async fn active_for_account(&self, account_id: DbId) -> AppResult<Vec<RefreshToken>> {
        Ok(self.tokens.list_active_refresh_tokens(account_id).await?)
    }

    /// Exchange an active secret for a new one on the same account.
    ///
    /// The old token is revoked with a conditional update, so when two
    /// callers present the same secret at once only one of them gets a new
    /// token; the other fails with `TokenNotFound`.
    pub async fn rotate(
        &self,
        raw_secret: &str,
        ip: &str,
        user_agent: Option<&str>,
    ) -> AppResult<Rotation> {
        if raw_secret.is_empty() {
            return Err(CoreError::TokenNotFound.into());
        }
        let revocation = Revocation {
            revoked_by_ip: ip.to_string(),
            reason: REASON_REPLACED.to_string(),
        };
        let old = self
            .tokens
            .revoke_refresh_token_if_active(&self.digest(raw_secret), &revocation)
            .await?
            .ok_or(CoreError::TokenNotFound)?;

        let secret = self.issue(old.account_id, ip, user_agent).await?;
        tracing::info!(account_id = old.account_id, replaced = old.id, "Refresh token rotated");
        Ok(Rotation {
            account_id: old.account_id,
            secret,
        })
    }

    /// Hard-delete every expired or revoked token. Returns the count deleted.
    pub async fn purge_inactive(&self) -> AppResult<u64> {
        Ok(self.tokens.delete_inactive_refresh_tokens().await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use backoffice_db::memory::MemoryStore;

    use super::*;
    use crate::error::AppError;

    fn store_with(days: i64) -> (RefreshTokenStore, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        (RefreshTokenStore::new(memory.clone(), "digest-key", days), memory)
    }

    #[tokio::test]
    async fn issued_secret_validates() {
        let (store, _) = store_with(7);
        let secret = store.issue(1, "10.0.0.1", Some("agent")).await.unwrap();
        assert!(store.validate(&secret).await.unwrap());
        assert!(!store.validate("not-a-token").await.unwrap());
        assert!(!store.validate("").await.unwrap());
    }

    #[tokio::test]
    async fn raw_secret_is_never_stored() {
        let (store, memory) = store_with(7);
        let secret = store.issue(1, "10.0.0.1", None).await.unwrap();
        let row = store.find(&secret).await.unwrap().unwrap();

        assert_ne!(row.token_hash, secret);
        assert!(memory.find_refresh_token(&secret).await.unwrap().is_none());
        assert_eq!(row.created_by_ip.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn expired_token_does_not_validate() {
        let (store, _) = store_with(-1);
        let secret = store.issue(1, "10.0.0.1", None).await.unwrap();
        assert!(!store.validate(&secret).await.unwrap());
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let (store, _) = store_with(7);
        let secret = store.issue(1, "10.0.0.1", None).await.unwrap();

        assert_eq!(
            store.revoke(&secret, "10.0.0.2", None).await.unwrap(),
            RevokeOutcome::Revoked
        );
        let first = store.find(&secret).await.unwrap().unwrap();
        assert!(first.revoked_at.is_some());

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(
            store.revoke(&secret, "10.0.0.3", Some("again")).await.unwrap(),
            RevokeOutcome::AlreadyRevoked
        );
        assert!(!store.validate(&secret).await.unwrap());

        let row = store.find(&secret).await.unwrap().unwrap();
        assert_eq!(row.revoked_at, first.revoked_at);
        assert_eq!(row.revocation_reason.as_deref(), Some(REASON_REVOKED));
        assert_eq!(row.revoked_by_ip.as_deref(), Some("10.0.0.2"));
    }

    #[tokio::test]
    async fn revoking_unknown_token_is_not_found() {
        let (store, _) = store_with(7);
        assert_matches!(
            store.revoke("unknown", "10.0.0.2", None).await,
            Err(AppError::Core(CoreError::TokenNotFound))
        );
    }

    #[tokio::test]
    async fn revoke_all_only_touches_one_account() {
        let (store, _) = store_with(7);
        for _ in 0..3 {
            store.issue(1, "10.0.0.1", None).await.unwrap();
        }
        let other = store.issue(2, "10.0.0.1", None).await.unwrap();

        assert_eq!(store.revoke_all_for_account(1, "10.0.0.9", None).await.unwrap(), 3);
        assert_eq!(store.active_count_for_account(1).await.unwrap(), 0);
        assert_eq!(store.active_count_for_account(2).await.unwrap(), 1);
        assert!(store.validate(&other).await.unwrap());
    }

    #[tokio::test]
    async fn rotation_is_single_use() {
        let (store, _) = store_with(7);
        let secret = store.issue(5, "10.0.0.1", None).await.unwrap();

        let rotation = store.rotate(&secret, "10.0.0.1", None).await.unwrap();
        assert_eq!(rotation.account_id, 5);
        assert!(store.validate(&rotation.secret).await.unwrap());
        assert!(!store.validate(&secret).await.unwrap());

        let old = store.find(&secret).await.unwrap().unwrap();
        assert_eq!(old.revocation_reason.as_deref(), Some(REASON_REPLACED));

        assert_matches!(
            store.rotate(&secret, "10.0.0.1", None).await,
            Err(AppError::Core(CoreError::TokenNotFound))
        );
    }

    #[tokio::test]
    async fn concurrent_rotation_has_one_winner() {
        let (store, _) = store_with(7);
        let store = Arc::new(store);
        let secret = store.issue(5, "10.0.0.1", None).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let secret = secret.clone();
                tokio::spawn(async move { store.rotate(&secret, "10.0.0.1", None).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.active_count_for_account(5).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sessions_are_listed_newest_first() {
        let (store, _) = store_with(7);
        let first = store.issue(9, "10.0.0.1", None).await.unwrap();
        let second = store.issue(9, "10.0.0.1", None).await.unwrap();

        let active = store.active_for_account(9).await.unwrap();
        assert_eq!(active.len(), 2);
        let newest = store.find(&second).await.unwrap().unwrap();
        let oldest = store.find(&first).await.unwrap().unwrap();
        assert_eq!(active[0].id, newest.id);
        assert_eq!(active[1].id, oldest.id);
    }

    #[tokio::test]
    async fn purge_removes_only_inactive_tokens() {
        let (store, _) = store_with(7);
        let live = store.issue(1, "10.0.0.1", None).await.unwrap();
        let revoked = store.issue(1, "10.0.0.1", None).await.unwrap();
        store.revoke(&revoked, "10.0.0.1", None).await.unwrap();

        assert_eq!(store.purge_inactive().await.unwrap(), 1);
        assert_eq!(store.purge_inactive().await.unwrap(), 0);
        assert!(store.validate(&live).await.unwrap());
        assert!(store.find(&revoked).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn digest_key_change_orphans_existing_tokens() {
        let memory = Arc::new(MemoryStore::new());
        let a = RefreshTokenStore::new(memory.clone(), "key-a", 7);
        let b = RefreshTokenStore::new(memory.clone(), "key-b", 7);

        let secret = a.issue(1, "10.0.0.1", None).await.unwrap();
        assert!(a.validate(&secret).await.unwrap());
        assert!(!b.validate(&secret).await.unwrap());
    }
}
