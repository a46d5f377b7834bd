//! Login audit entity model and DTOs.
//!
//! Audit rows are immutable once created (no `updated_at`).

use backoffice_core::login_audit::{truncate_chars, MAX_FAILURE_REASON_CHARS, MAX_USER_AGENT_CHARS};
use backoffice_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A single login attempt from the `login_audits` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAudit {
    pub id: DbId,
    /// `None` when the attempted username does not exist.
    pub account_id: Option<DbId>,
    pub login_time: Timestamp,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
}

/// DTO for inserting a login attempt.
///
/// Build it with [`CreateLoginAudit::new`] so the field caps are applied.
#[derive(Debug, Clone)]
pub struct CreateLoginAudit {
    pub account_id: Option<DbId>,
    pub login_time: Timestamp,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
}

impl CreateLoginAudit {
    pub fn new(
        account_id: Option<DbId>,
        login_time: Timestamp,
        ip_address: &str,
        user_agent: Option<&str>,
        success: bool,
        failure_reason: Option<&str>,
    ) -> Self {
        Self {
            account_id,
            login_time,
            ip_address: ip_address.to_string(),
            user_agent: user_agent.map(|ua| truncate_chars(ua, MAX_USER_AGENT_CHARS)),
            success,
            failure_reason: failure_reason.map(|r| truncate_chars(r, MAX_FAILURE_REASON_CHARS)),
        }
    }
}
