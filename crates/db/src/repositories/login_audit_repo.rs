//! Repository for the `login_audits` table.

use backoffice_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::login_audit::{CreateLoginAudit, LoginAudit};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, account_id, login_time, ip_address, user_agent, success, failure_reason";

/// Provides insert, query, and retention operations for login audits.
pub struct LoginAuditRepo;

impl LoginAuditRepo {
    /// Insert one login attempt.
    pub async fn create(pool: &PgPool, input: &CreateLoginAudit) -> Result<LoginAudit, sqlx::Error> {
        let query = format!(
            "INSERT INTO login_audits (account_id, login_time, ip_address, user_agent, success, failure_reason)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoginAudit>(&query)
            .bind(input.account_id)
            .bind(input.login_time)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(input.success)
            .bind(&input.failure_reason)
            .fetch_one(pool)
            .await
    }

    /// Attempts for an account since `since`, newest first.
    pub async fn history(
        pool: &PgPool,
        account_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<LoginAudit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM login_audits
             WHERE account_id = $1 AND login_time >= $2
             ORDER BY login_time DESC, id DESC"
        );
        sqlx::query_as::<_, LoginAudit>(&query)
            .bind(account_id)
            .bind(since)
            .fetch_all(pool)
            .await
    }

    /// All attempts since `since` from IPs with more than `threshold`
    /// failures in that window, newest first, ties by IP ascending.
    pub async fn suspicious_since(
        pool: &PgPool,
        since: Timestamp,
        threshold: i64,
    ) -> Result<Vec<LoginAudit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM login_audits
             WHERE login_time >= $1
               AND ip_address IN (
                   SELECT ip_address FROM login_audits
                   WHERE success = false AND login_time >= $1
                   GROUP BY ip_address
                   HAVING COUNT(*) > $2
               )
             ORDER BY login_time DESC, ip_address ASC"
        );
        sqlx::query_as::<_, LoginAudit>(&query)
            .bind(since)
            .bind(threshold)
            .fetch_all(pool)
            .await
    }

    /// Count failed attempts for an account since `since`.
    pub async fn count_failed_for_account(
        pool: &PgPool,
        account_id: DbId,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM login_audits
             WHERE account_id = $1 AND success = false AND login_time >= $2",
        )
        .bind(account_id)
        .bind(since)
        .fetch_one(pool)
        .await
    }

    /// Count failed attempts from an IP since `since`.
    pub async fn count_failed_from_ip(
        pool: &PgPool,
        ip_address: &str,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM login_audits
             WHERE ip_address = $1 AND success = false AND login_time >= $2",
        )
        .bind(ip_address)
        .bind(since)
        .fetch_one(pool)
        .await
    }

    /// Most recent attempt for an account with the given outcome.
    pub async fn last_attempt(
        pool: &PgPool,
        account_id: DbId,
        success: bool,
    ) -> Result<Option<LoginAudit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM login_audits
             WHERE account_id = $1 AND success = $2
             ORDER BY login_time DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, LoginAudit>(&query)
            .bind(account_id)
            .bind(success)
            .fetch_optional(pool)
            .await
    }

    /// Delete attempts older than `cutoff`. Returns the count of deleted rows.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM login_audits WHERE login_time < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
