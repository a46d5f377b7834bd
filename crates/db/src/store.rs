//! The persistence contract the auth services are written against.
//!
//! Method names are unique across the four traits so a single store type can
//! implement all of them without call-site ambiguity. Errors use the `sqlx`
//! vocabulary for every backend; a missing row that the caller required is
//! `sqlx::Error::RowNotFound`.

use async_trait::async_trait;
use backoffice_core::types::{DbId, Timestamp};

use crate::models::account::{Account, CreateAccount};
use crate::models::login_audit::{CreateLoginAudit, LoginAudit};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken, Revocation, RevokeResult};
use crate::models::role::{CreateRole, Role};

/// Read access to accounts, plus the active flag toggle.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create_account(&self, input: &CreateAccount) -> Result<Account, sqlx::Error>;

    async fn find_account(&self, id: DbId) -> Result<Option<Account>, sqlx::Error>;

    /// Exact, case-sensitive username match.
    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, sqlx::Error>;

    async fn set_account_active(&self, id: DbId, is_active: bool) -> Result<bool, sqlx::Error>;
}

/// The role table.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn create_role(&self, input: &CreateRole) -> Result<Role, sqlx::Error>;

    async fn find_role(&self, id: DbId) -> Result<Option<Role>, sqlx::Error>;

    /// Every role, ordered by id.
    async fn list_roles(&self) -> Result<Vec<Role>, sqlx::Error>;

    async fn set_role_parent(
        &self,
        id: DbId,
        parent_role_id: Option<DbId>,
    ) -> Result<Option<Role>, sqlx::Error>;
}

/// Refresh token rows, addressed by digest.
///
/// `insert_refresh_token` and `revoke_account_refresh_tokens` must be
/// mutually atomic per account.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert_refresh_token(
        &self,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, sqlx::Error>;

    async fn find_refresh_token(&self, token_hash: &str)
        -> Result<Option<RefreshToken>, sqlx::Error>;

    async fn revoke_refresh_token(
        &self,
        token_hash: &str,
        revocation: &Revocation,
    ) -> Result<RevokeResult, sqlx::Error>;

    /// Revoke only if active; `None` means nothing was changed.
    async fn revoke_refresh_token_if_active(
        &self,
        token_hash: &str,
        revocation: &Revocation,
    ) -> Result<Option<RefreshToken>, sqlx::Error>;

    async fn revoke_account_refresh_tokens(
        &self,
        account_id: DbId,
        revocation: &Revocation,
    ) -> Result<u64, sqlx::Error>;

    async fn count_active_refresh_tokens(&self, account_id: DbId) -> Result<i64, sqlx::Error>;

    /// Active tokens, newest first.
    async fn list_active_refresh_tokens(
        &self,
        account_id: DbId,
    ) -> Result<Vec<RefreshToken>, sqlx::Error>;

    /// Hard-delete every expired or revoked row.
    async fn delete_inactive_refresh_tokens(&self) -> Result<u64, sqlx::Error>;
}

/// The append-only login audit trail.
#[async_trait]
pub trait LoginAuditRepository: Send + Sync {
    async fn insert_login_audit(&self, input: &CreateLoginAudit)
        -> Result<LoginAudit, sqlx::Error>;

    /// Newest first.
    async fn login_history(
        &self,
        account_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<LoginAudit>, sqlx::Error>;

    /// Entries since `since` from IPs with more than `threshold` failures in
    /// that window, newest first, ties broken by IP ascending.
    async fn suspicious_login_activity(
        &self,
        since: Timestamp,
        threshold: usize,
    ) -> Result<Vec<LoginAudit>, sqlx::Error>;

    async fn count_failed_logins_for_account(
        &self,
        account_id: DbId,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error>;

    async fn count_failed_logins_from_ip(
        &self,
        ip_address: &str,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error>;

    async fn last_login_attempt(
        &self,
        account_id: DbId,
        success: bool,
    ) -> Result<Option<LoginAudit>, sqlx::Error>;

    async fn delete_login_audits_older_than(&self, cutoff: Timestamp) -> Result<u64, sqlx::Error>;
}

/// Liveness check for the backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), sqlx::Error>;
}
