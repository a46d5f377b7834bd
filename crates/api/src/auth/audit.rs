//! The login audit trail.
//!
//! [`LoginAuditLog::record`] never fails: the write runs on its own task and
//! the caller waits at most [`AUDIT_WRITE_BUDGET`] for it. A slow or broken
//! audit store is logged, never propagated into the login flow.

use std::sync::Arc;
use std::time::Duration;

use backoffice_core::error::CoreError;
use backoffice_core::login_audit::{DEFAULT_HISTORY_DAYS, SUSPICIOUS_FAILURE_THRESHOLD};
use backoffice_core::types::{DbId, Timestamp};
use backoffice_db::models::login_audit::{CreateLoginAudit, LoginAudit};
use backoffice_db::store::LoginAuditRepository;
use chrono::{TimeDelta, Utc};

use crate::error::AppResult;

/// How long a login waits for its audit entry to be written.
pub const AUDIT_WRITE_BUDGET: Duration = Duration::from_millis(250);

/// Records and queries login attempts.
pub struct LoginAuditLog {
    audits: Arc<dyn LoginAuditRepository>,
    write_budget: Duration,
}

impl LoginAuditLog {
    pub fn new(audits: Arc<dyn LoginAuditRepository>) -> Self {
        Self::with_write_budget(audits, AUDIT_WRITE_BUDGET)
    }

    pub fn with_write_budget(audits: Arc<dyn LoginAuditRepository>, write_budget: Duration) -> Self {
        Self {
            audits,
            write_budget,
        }
    }

    /// Record one login attempt, stamped now.
    ///
    /// `user_agent` and `failure_reason` are truncated to their column caps.
    pub async fn record(
        &self,
        account_id: Option<DbId>,
        ip_address: &str,
        user_agent: Option<&str>,
        success: bool,
        failure_reason: Option<&str>,
    ) {
        let entry = CreateLoginAudit::new(
            account_id,
            Utc::now(),
            ip_address,
            user_agent,
            success,
            failure_reason,
        );
        let audits = Arc::clone(&self.audits);
        let write = tokio::spawn(async move {
            if let Err(e) = audits.insert_login_audit(&entry).await {
                tracing::error!(
                    error = %e,
                    account_id = ?entry.account_id,
                    ip = %entry.ip_address,
                    success = entry.success,
                    "Failed to write login audit entry"
                );
            }
        });

        match tokio::time::timeout(self.write_budget, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Login audit task aborted"),
            Err(_) => tracing::warn!(
                budget_ms = self.write_budget.as_millis() as u64,
                "Login audit write is slow; continuing without waiting"
            ),
        }
    }

    /// Attempts for an account within the last `within_days` (default 30),
    /// newest first.
    pub async fn history(
        &self,
        account_id: DbId,
        within_days: Option<i64>,
    ) -> AppResult<Vec<LoginAudit>> {
        let days = within_days.unwrap_or(DEFAULT_HISTORY_DAYS);
        let since = before_now(TimeDelta::try_days(days), "days")?;
        Ok(self.audits.login_history(account_id, since).await?)
    }

    /// Every attempt since `since` from an IP with more than five failures in
    /// that window, newest first, ties broken by IP ascending.
    pub async fn suspicious_activity(&self, since: Timestamp) -> AppResult<Vec<LoginAudit>> {
        Ok(self
            .audits
            .suspicious_login_activity(since, SUSPICIOUS_FAILURE_THRESHOLD)
            .await?)
    }

    pub async fn failed_attempts_for_account(
        &self,
        account_id: DbId,
        since: Timestamp,
    ) -> AppResult<i64> {
        Ok(self
            .audits
            .count_failed_logins_for_account(account_id, since)
            .await?)
    }

    pub async fn failed_attempts_from_ip(&self, ip_address: &str, since: Timestamp) -> AppResult<i64> {
        Ok(self.audits.count_failed_logins_from_ip(ip_address, since).await?)
    }

    pub async fn last_successful_login(&self, account_id: DbId) -> AppResult<Option<LoginAudit>> {
        Ok(self.audits.last_login_attempt(account_id, true).await?)
    }

    pub async fn last_failed_login(&self, account_id: DbId) -> AppResult<Option<LoginAudit>> {
        Ok(self.audits.last_login_attempt(account_id, false).await?)
    }

    /// Delete entries older than `days_to_keep` days. Returns the count deleted.
    ///
    /// `days_to_keep` must be positive; a cutoff in the future would empty
    /// the trail.
    pub async fn purge_older_than(&self, days_to_keep: i64) -> AppResult<u64> {
        if days_to_keep <= 0 {
            return Err(CoreError::Validation(format!(
                "retention days must be positive, got {days_to_keep}"
            ))
            .into());
        }
        let cutoff = before_now(TimeDelta::try_days(days_to_keep), "retention days")?;
        Ok(self.audits.delete_login_audits_older_than(cutoff).await?)
    }
}

/// The instant `span` before now.
///
/// A span that is unrepresentable, or that would land outside the calendar
/// range, is a validation error naming `field`.
pub fn before_now(span: Option<TimeDelta>, field: &str) -> AppResult<Timestamp> {
    span.and_then(|span| Utc::now().checked_sub_signed(span))
        .ok_or_else(|| CoreError::Validation(format!("{field} is out of range")).into())
}
