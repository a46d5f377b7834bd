//! Repository for the `refresh_tokens` table.
//!
//! Issuing a token and revoking all of an account's tokens both take a
//! transaction-scoped advisory lock keyed on the account, so the two never
//! interleave: a token issued concurrently with a bulk revoke is either
//! revoked by it or committed after it, never half-applied.

use backoffice_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::refresh_token::{CreateRefreshToken, RefreshToken, Revocation, RevokeResult};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, account_id, token_hash, created_at, expires_at, revoked_at, \
                        revoked_by_ip, revocation_reason, created_by_ip, user_agent";

/// Predicate for the active-token invariant.
const ACTIVE: &str = "revoked_at IS NULL AND expires_at > NOW()";

/// Provides lifecycle operations for refresh tokens.
pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    /// Insert a new token row, returning it.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_account(&mut tx, input.account_id).await?;

        let query = format!(
            "INSERT INTO refresh_tokens (account_id, token_hash, expires_at, created_by_ip, user_agent)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let token = sqlx::query_as::<_, RefreshToken>(&query)
            .bind(input.account_id)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .bind(&input.created_by_ip)
            .bind(&input.user_agent)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(token)
    }

    /// Find a token by digest regardless of its state.
    pub async fn find_by_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM refresh_tokens WHERE token_hash = $1");
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke a token unless it is already revoked.
    pub async fn revoke(
        pool: &PgPool,
        token_hash: &str,
        revocation: &Revocation,
    ) -> Result<RevokeResult, sqlx::Error> {
        let query = format!(
            "UPDATE refresh_tokens
             SET revoked_at = NOW(), revoked_by_ip = $2, revocation_reason = $3
             WHERE token_hash = $1 AND revoked_at IS NULL
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token_hash)
            .bind(&revocation.revoked_by_ip)
            .bind(&revocation.reason)
            .fetch_optional(pool)
            .await?;

        if let Some(token) = updated {
            return Ok(RevokeResult::Revoked(token));
        }
        Ok(match Self::find_by_hash(pool, token_hash).await? {
            Some(existing) => RevokeResult::AlreadyRevoked(existing),
            None => RevokeResult::NotFound,
        })
    }

    /// Revoke a token only if it is currently active. Returns the revoked row,
    /// or `None` if the token is unknown, expired, or already revoked.
    ///
    /// The update is a single conditional statement, so of two concurrent
    /// callers presenting the same token at most one gets `Some`.
    pub async fn revoke_if_active(
        pool: &PgPool,
        token_hash: &str,
        revocation: &Revocation,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let query = format!(
            "UPDATE refresh_tokens
             SET revoked_at = NOW(), revoked_by_ip = $2, revocation_reason = $3
             WHERE token_hash = $1 AND {ACTIVE}
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token_hash)
            .bind(&revocation.revoked_by_ip)
            .bind(&revocation.reason)
            .fetch_optional(pool)
            .await
    }

    /// Revoke every active token for an account. Returns the count revoked.
    pub async fn revoke_all_for_account(
        pool: &PgPool,
        account_id: DbId,
        revocation: &Revocation,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        lock_account(&mut tx, account_id).await?;

        let query = format!(
            "UPDATE refresh_tokens
             SET revoked_at = NOW(), revoked_by_ip = $2, revocation_reason = $3
             WHERE account_id = $1 AND {ACTIVE}"
        );
        let result = sqlx::query(&query)
            .bind(account_id)
            .bind(&revocation.revoked_by_ip)
            .bind(&revocation.reason)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Count active tokens for an account.
    pub async fn count_active_for_account(
        pool: &PgPool,
        account_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*)::BIGINT FROM refresh_tokens WHERE account_id = $1 AND {ACTIVE}"
        );
        sqlx::query_scalar::<_, i64>(&query)
            .bind(account_id)
            .fetch_one(pool)
            .await
    }

    /// List active tokens for an account, newest first.
    pub async fn list_active_for_account(
        pool: &PgPool,
        account_id: DbId,
    ) -> Result<Vec<RefreshToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM refresh_tokens
             WHERE account_id = $1 AND {ACTIVE}
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(account_id)
            .fetch_all(pool)
            .await
    }

    /// Delete expired or revoked tokens. Returns the count of deleted rows.
    pub async fn delete_inactive(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens WHERE expires_at < NOW() OR revoked_at IS NOT NULL",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Serialize token issuance and bulk revocation for one account until the
/// transaction ends.
async fn lock_account(
    tx: &mut Transaction<'_, Postgres>,
    account_id: DbId,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended('refresh_tokens:' || $1::TEXT, 0))")
        .bind(account_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
