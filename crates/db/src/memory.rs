//! In-process implementation of the persistence contract.
//!
//! Every operation takes the same table lock, so issuing a token and revoking
//! all of an account's tokens are trivially atomic with respect to each
//! other. Used by the service and HTTP tests, and handy for local demos
//! without PostgreSQL.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use backoffice_core::login_audit::suspicious_ips;
use backoffice_core::types::{DbId, Timestamp};
use chrono::Utc;

use crate::models::account::{Account, CreateAccount};
use crate::models::login_audit::{CreateLoginAudit, LoginAudit};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken, Revocation, RevokeResult};
use crate::models::role::{CreateRole, Role};
use crate::store::{
    AccountRepository, LoginAuditRepository, RefreshTokenRepository, RoleRepository, StoreHealth,
};

#[derive(Default)]
struct Tables {
    next_id: DbId,
    accounts: Vec<Account>,
    roles: Vec<Role>,
    refresh_tokens: Vec<RefreshToken>,
    login_audits: Vec<LoginAudit>,
}

impl Tables {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

fn revoke_row(token: &mut RefreshToken, revocation: &Revocation, now: Timestamp) {
    token.revoked_at = Some(now);
    token.revoked_by_ip = Some(revocation.revoked_by_ip.clone());
    token.revocation_reason = Some(revocation.reason.clone());
}

/// Store backed by vectors behind a single mutex.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, sqlx::Error> {
        self.tables
            .lock()
            .map_err(|_| sqlx::Error::Protocol("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.tables().map(|_| ())
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn create_account(&self, input: &CreateAccount) -> Result<Account, sqlx::Error> {
        let mut tables = self.tables()?;
        if tables.accounts.iter().any(|a| a.username == input.username) {
            return Err(sqlx::Error::Protocol(format!(
                "duplicate username '{}'",
                input.username
            )));
        }
        if !tables.roles.iter().any(|r| r.id == input.role_id) {
            return Err(sqlx::Error::RowNotFound);
        }
        let now = Utc::now();
        let account = Account {
            id: tables.allocate_id(),
            username: input.username.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            role_id: input.role_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_account(&self, id: DbId) -> Result<Option<Account>, sqlx::Error> {
        Ok(self.tables()?.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        Ok(self
            .tables()?
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn set_account_active(&self, id: DbId, is_active: bool) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables()?;
        match tables.accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.is_active = is_active;
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn create_role(&self, input: &CreateRole) -> Result<Role, sqlx::Error> {
        let mut tables = self.tables()?;
        if tables.roles.iter().any(|r| r.name == input.name) {
            return Err(sqlx::Error::Protocol(format!(
                "duplicate role name '{}'",
                input.name
            )));
        }
        if let Some(parent) = input.parent_role_id {
            if !tables.roles.iter().any(|r| r.id == parent) {
                return Err(sqlx::Error::RowNotFound);
            }
        }
        let now = Utc::now();
        let role = Role {
            id: tables.allocate_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            parent_role_id: input.parent_role_id,
            created_at: now,
            updated_at: now,
        };
        tables.roles.push(role.clone());
        Ok(role)
    }

    async fn find_role(&self, id: DbId) -> Result<Option<Role>, sqlx::Error> {
        Ok(self.tables()?.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, sqlx::Error> {
        let mut roles = self.tables()?.roles.clone();
        roles.sort_by_key(|r| r.id);
        Ok(roles)
    }

    async fn set_role_parent(
        &self,
        id: DbId,
        parent_role_id: Option<DbId>,
    ) -> Result<Option<Role>, sqlx::Error> {
        let mut tables = self.tables()?;
        Ok(tables.roles.iter_mut().find(|r| r.id == id).map(|role| {
            role.parent_role_id = parent_role_id;
            role.updated_at = Utc::now();
            role.clone()
        }))
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn insert_refresh_token(
        &self,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, sqlx::Error> {
        let mut tables = self.tables()?;
        if tables
            .refresh_tokens
            .iter()
            .any(|t| t.token_hash == input.token_hash)
        {
            return Err(sqlx::Error::Protocol("duplicate refresh token digest".into()));
        }
        let token = RefreshToken {
            id: tables.allocate_id(),
            account_id: input.account_id,
            token_hash: input.token_hash.clone(),
            created_at: Utc::now(),
            expires_at: input.expires_at,
            revoked_at: None,
            revoked_by_ip: None,
            revocation_reason: None,
            created_by_ip: input.created_by_ip.clone(),
            user_agent: input.user_agent.clone(),
        };
        tables.refresh_tokens.push(token.clone());
        Ok(token)
    }

    async fn find_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        Ok(self
            .tables()?
            .refresh_tokens
            .iter()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn revoke_refresh_token(
        &self,
        token_hash: &str,
        revocation: &Revocation,
    ) -> Result<RevokeResult, sqlx::Error> {
        let mut tables = self.tables()?;
        let Some(token) = tables
            .refresh_tokens
            .iter_mut()
            .find(|t| t.token_hash == token_hash)
        else {
            return Ok(RevokeResult::NotFound);
        };
        if token.is_revoked() {
            return Ok(RevokeResult::AlreadyRevoked(token.clone()));
        }
        revoke_row(token, revocation, Utc::now());
        Ok(RevokeResult::Revoked(token.clone()))
    }

    async fn revoke_refresh_token_if_active(
        &self,
        token_hash: &str,
        revocation: &Revocation,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let now = Utc::now();
        let mut tables = self.tables()?;
        Ok(tables
            .refresh_tokens
            .iter_mut()
            .find(|t| t.token_hash == token_hash && t.is_active_at(now))
            .map(|token| {
                revoke_row(token, revocation, now);
                token.clone()
            }))
    }

    async fn revoke_account_refresh_tokens(
        &self,
        account_id: DbId,
        revocation: &Revocation,
    ) -> Result<u64, sqlx::Error> {
        let now = Utc::now();
        let mut tables = self.tables()?;
        let mut revoked = 0;
        for token in tables
            .refresh_tokens
            .iter_mut()
            .filter(|t| t.account_id == account_id && t.is_active_at(now))
        {
            revoke_row(token, revocation, now);
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn count_active_refresh_tokens(&self, account_id: DbId) -> Result<i64, sqlx::Error> {
        let now = Utc::now();
        let count = self
            .tables()?
            .refresh_tokens
            .iter()
            .filter(|t| t.account_id == account_id && t.is_active_at(now))
            .count();
        Ok(count as i64)
    }

    async fn list_active_refresh_tokens(
        &self,
        account_id: DbId,
    ) -> Result<Vec<RefreshToken>, sqlx::Error> {
        let now = Utc::now();
        let mut active: Vec<RefreshToken> = self
            .tables()?
            .refresh_tokens
            .iter()
            .filter(|t| t.account_id == account_id && t.is_active_at(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(active)
    }

    async fn delete_inactive_refresh_tokens(&self) -> Result<u64, sqlx::Error> {
        let now = Utc::now();
        let mut tables = self.tables()?;
        let before = tables.refresh_tokens.len();
        tables
            .refresh_tokens
            .retain(|t| t.expires_at >= now && !t.is_revoked());
        Ok((before - tables.refresh_tokens.len()) as u64)
    }
}

#[async_trait]
impl LoginAuditRepository for MemoryStore {
    async fn insert_login_audit(
        &self,
        input: &CreateLoginAudit,
    ) -> Result<LoginAudit, sqlx::Error> {
        let mut tables = self.tables()?;
        let audit = LoginAudit {
            id: tables.allocate_id(),
            account_id: input.account_id,
            login_time: input.login_time,
            ip_address: input.ip_address.clone(),
            user_agent: input.user_agent.clone(),
            success: input.success,
            failure_reason: input.failure_reason.clone(),
        };
        tables.login_audits.push(audit.clone());
        Ok(audit)
    }

    async fn login_history(
        &self,
        account_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<LoginAudit>, sqlx::Error> {
        let mut history: Vec<LoginAudit> = self
            .tables()?
            .login_audits
            .iter()
            .filter(|a| a.account_id == Some(account_id) && a.login_time >= since)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.login_time.cmp(&a.login_time).then(b.id.cmp(&a.id)));
        Ok(history)
    }

    async fn suspicious_login_activity(
        &self,
        since: Timestamp,
        threshold: usize,
    ) -> Result<Vec<LoginAudit>, sqlx::Error> {
        let tables = self.tables()?;
        let window: Vec<&LoginAudit> = tables
            .login_audits
            .iter()
            .filter(|a| a.login_time >= since)
            .collect();
        let flagged = suspicious_ips(
            window.iter().copied().map(|a| (a.ip_address.as_str(), a.success)),
            threshold,
        );
        let mut entries: Vec<LoginAudit> = window
            .into_iter()
            .filter(|a| flagged.contains(a.ip_address.as_str()))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.login_time
                .cmp(&a.login_time)
                .then_with(|| a.ip_address.cmp(&b.ip_address))
        });
        Ok(entries)
    }

    async fn count_failed_logins_for_account(
        &self,
        account_id: DbId,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let count = self
            .tables()?
            .login_audits
            .iter()
            .filter(|a| a.account_id == Some(account_id) && !a.success && a.login_time >= since)
            .count();
        Ok(count as i64)
    }

    async fn count_failed_logins_from_ip(
        &self,
        ip_address: &str,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let count = self
            .tables()?
            .login_audits
            .iter()
            .filter(|a| a.ip_address == ip_address && !a.success && a.login_time >= since)
            .count();
        Ok(count as i64)
    }

    async fn last_login_attempt(
        &self,
        account_id: DbId,
        success: bool,
    ) -> Result<Option<LoginAudit>, sqlx::Error> {
        Ok(self
            .tables()?
            .login_audits
            .iter()
            .filter(|a| a.account_id == Some(account_id) && a.success == success)
            .max_by(|a, b| a.login_time.cmp(&b.login_time).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn delete_login_audits_older_than(&self, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let mut tables = self.tables()?;
        let before = tables.login_audits.len();
        tables.login_audits.retain(|a| a.login_time >= cutoff);
        Ok((before - tables.login_audits.len()) as u64)
    }
}
