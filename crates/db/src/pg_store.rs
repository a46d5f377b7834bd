//! PostgreSQL implementation of the persistence contract.

use async_trait::async_trait;
use backoffice_core::types::{DbId, Timestamp};

use crate::models::account::{Account, CreateAccount};
use crate::models::login_audit::{CreateLoginAudit, LoginAudit};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken, Revocation, RevokeResult};
use crate::models::role::{CreateRole, Role};
use crate::repositories::{AccountRepo, LoginAuditRepo, RefreshTokenRepo, RoleRepo};
use crate::store::{
    AccountRepository, LoginAuditRepository, RefreshTokenRepository, RoleRepository, StoreHealth,
};
use crate::{health_check, DbPool};

/// Adapts the zero-sized repositories to the store traits.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        health_check(&self.pool).await
    }
}

#[async_trait]
impl AccountRepository for PgStore {
    async fn create_account(&self, input: &CreateAccount) -> Result<Account, sqlx::Error> {
        AccountRepo::create(&self.pool, input).await
    }

    async fn find_account(&self, id: DbId) -> Result<Option<Account>, sqlx::Error> {
        AccountRepo::find_by_id(&self.pool, id).await
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        AccountRepo::find_by_username(&self.pool, username).await
    }

    async fn set_account_active(&self, id: DbId, is_active: bool) -> Result<bool, sqlx::Error> {
        AccountRepo::set_active(&self.pool, id, is_active).await
    }
}

#[async_trait]
impl RoleRepository for PgStore {
    async fn create_role(&self, input: &CreateRole) -> Result<Role, sqlx::Error> {
        RoleRepo::create(&self.pool, input).await
    }

    async fn find_role(&self, id: DbId) -> Result<Option<Role>, sqlx::Error> {
        RoleRepo::find_by_id(&self.pool, id).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>, sqlx::Error> {
        RoleRepo::list(&self.pool).await
    }

    async fn set_role_parent(
        &self,
        id: DbId,
        parent_role_id: Option<DbId>,
    ) -> Result<Option<Role>, sqlx::Error> {
        RoleRepo::set_parent(&self.pool, id, parent_role_id).await
    }
}

#[async_trait]
impl RefreshTokenRepository for PgStore {
    async fn insert_refresh_token(
        &self,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, sqlx::Error> {
        RefreshTokenRepo::create(&self.pool, input).await
    }

    async fn find_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        RefreshTokenRepo::find_by_hash(&self.pool, token_hash).await
    }

    async fn revoke_refresh_token(
        &self,
        token_hash: &str,
        revocation: &Revocation,
    ) -> Result<RevokeResult, sqlx::Error> {
        RefreshTokenRepo::revoke(&self.pool, token_hash, revocation).await
    }

    async fn revoke_refresh_token_if_active(
        &self,
        token_hash: &str,
        revocation: &Revocation,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        RefreshTokenRepo::revoke_if_active(&self.pool, token_hash, revocation).await
    }

    async fn revoke_account_refresh_tokens(
        &self,
        account_id: DbId,
        revocation: &Revocation,
    ) -> Result<u64, sqlx::Error> {
        RefreshTokenRepo::revoke_all_for_account(&self.pool, account_id, revocation).await
    }

    async fn count_active_refresh_tokens(&self, account_id: DbId) -> Result<i64, sqlx::Error> {
        RefreshTokenRepo::count_active_for_account(&self.pool, account_id).await
    }

    async fn list_active_refresh_tokens(
        &self,
        account_id: DbId,
    ) -> Result<Vec<RefreshToken>, sqlx::Error> {
        RefreshTokenRepo::list_active_for_account(&self.pool, account_id).await
    }

    async fn delete_inactive_refresh_tokens(&self) -> Result<u64, sqlx::Error> {
        RefreshTokenRepo::delete_inactive(&self.pool).await
    }
}

#[async_trait]
impl LoginAuditRepository for PgStore {
    async fn insert_login_audit(
        &self,
        input: &CreateLoginAudit,
    ) -> Result<LoginAudit, sqlx::Error> {
        LoginAuditRepo::create(&self.pool, input).await
    }

    async fn login_history(
        &self,
        account_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<LoginAudit>, sqlx::Error> {
        LoginAuditRepo::history(&self.pool, account_id, since).await
    }

    async fn suspicious_login_activity(
        &self,
        since: Timestamp,
        threshold: usize,
    ) -> Result<Vec<LoginAudit>, sqlx::Error> {
        let threshold = i64::try_from(threshold).unwrap_or(i64::MAX);
        LoginAuditRepo::suspicious_since(&self.pool, since, threshold).await
    }

    async fn count_failed_logins_for_account(
        &self,
        account_id: DbId,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        LoginAuditRepo::count_failed_for_account(&self.pool, account_id, since).await
    }

    async fn count_failed_logins_from_ip(
        &self,
        ip_address: &str,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        LoginAuditRepo::count_failed_from_ip(&self.pool, ip_address, since).await
    }

    async fn last_login_attempt(
        &self,
        account_id: DbId,
        success: bool,
    ) -> Result<Option<LoginAudit>, sqlx::Error> {
        LoginAuditRepo::last_attempt(&self.pool, account_id, success).await
    }

    async fn delete_login_audits_older_than(&self, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        LoginAuditRepo::delete_older_than(&self.pool, cutoff).await
    }
}
