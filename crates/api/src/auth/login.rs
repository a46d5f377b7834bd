//! Login, refresh, and logout flows.
//!
//! Every login attempt produces exactly one audit entry, success or not.
//! Audit writes go through [`LoginAuditLog::record`], which cannot fail, so
//! the audit trail never changes the outcome of a login.

use std::sync::Arc;

use backoffice_core::claims::AccountIdentity;
use backoffice_core::error::CoreError;
use backoffice_core::login_audit::failure_reasons;
use backoffice_core::refresh_token::REASON_LOGOUT;
use backoffice_core::types::{DbId, Timestamp};
use backoffice_db::models::account::{Account, AccountSummary};
use backoffice_db::store::AccountRepository;
use serde::Serialize;

use crate::auth::audit::LoginAuditLog;
use crate::auth::jwt::TokenIssuer;
use crate::auth::refresh::RefreshTokenStore;
use crate::auth::verifier::CredentialVerifier;
use crate::error::{AppError, AppResult};
use crate::roles::RoleHierarchy;

/// Returned by a successful login or refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub access_token: String,
    pub expires_at_utc: Timestamp,
    pub refresh_token: String,
    pub account_summary: AccountSummary,
}

/// Where a request came from, for audit and revocation records.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub ip_address: String,
    pub user_agent: Option<String>,
}

/// Orchestrates credential checks, token issuance, and auditing.
pub struct LoginService {
    accounts: Arc<dyn AccountRepository>,
    roles: Arc<RoleHierarchy>,
    verifier: CredentialVerifier,
    issuer: Arc<TokenIssuer>,
    refresh_tokens: Arc<RefreshTokenStore>,
    audit: Arc<LoginAuditLog>,
}

impl LoginService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        roles: Arc<RoleHierarchy>,
        issuer: Arc<TokenIssuer>,
        refresh_tokens: Arc<RefreshTokenStore>,
        audit: Arc<LoginAuditLog>,
    ) -> Self {
        Self {
            verifier: CredentialVerifier::new(Arc::clone(&accounts)),
            accounts,
            roles,
            issuer,
            refresh_tokens,
            audit,
        }
    }

    /// Authenticate with username and password.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client: &ClientContext,
    ) -> AppResult<LoginPayload> {
        let verification = match self.verifier.check(username, password).await {
            Ok(verification) => verification,
            Err(e) => {
                self.record_failure(None, client, failure_reasons::LOOKUP_FAILED)
                    .await;
                tracing::error!(error = %e, "Account lookup failed during login");
                return Err(e);
            }
        };
        let account_id = verification.account_id();
        if let Some(reason) = verification.failure_reason() {
            self.record_failure(account_id, client, reason).await;
        }
        let account = verification.into_result()?;

        let role_name = match self.roles.resolve_name(account.role_id).await {
            Ok(name) => name,
            Err(AppError::Core(CoreError::NotFound { .. })) => {
                self.record_failure(account_id, client, failure_reasons::ROLE_NOT_FOUND)
                    .await;
                tracing::error!(
                    account_id = account.id,
                    role_id = account.role_id,
                    "Account references a missing role"
                );
                return Err(missing_role());
            }
            Err(e) => {
                self.record_failure(account_id, client, failure_reasons::LOOKUP_FAILED)
                    .await;
                tracing::error!(
                    error = %e,
                    account_id = account.id,
                    "Role lookup failed during login"
                );
                return Err(e);
            }
        };

        let payload = match self.issue_payload(&account, &role_name, client).await {
            Ok(payload) => payload,
            Err(e) => {
                self.record_failure(account_id, client, failure_reasons::TOKEN_ISSUANCE_FAILED)
                    .await;
                return Err(e);
            }
        };

        self.audit
            .record(
                Some(account.id),
                &client.ip_address,
                client.user_agent.as_deref(),
                true,
                None,
            )
            .await;
        tracing::info!(account_id = account.id, "Login succeeded");
        Ok(payload)
    }

    /// Exchange a refresh token for a new access token and refresh token.
    ///
    /// Fails with `TokenNotFound` if the token is unknown, expired, revoked,
    /// or loses a concurrent rotation, and with `AccountInactive` if its
    /// account is gone or disabled.
    pub async fn refresh(
        &self,
        raw_secret: &str,
        client: &ClientContext,
    ) -> AppResult<LoginPayload> {
        let token = self
            .refresh_tokens
            .find_active(raw_secret)
            .await?
            .ok_or(CoreError::TokenNotFound)?;

        let account = self
            .accounts
            .find_account(token.account_id)
            .await?
            .filter(|account| account.is_active)
            .ok_or(CoreError::AccountInactive)?;
        let role_name = self
            .roles
            .resolve_name(account.role_id)
            .await
            .map_err(|e| match e {
                AppError::Core(CoreError::NotFound { .. }) => missing_role(),
                other => other,
            })?;

        let signed = self
            .issuer
            .issue(&identity(&account, &role_name))
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
        let rotation = self
            .refresh_tokens
            .rotate(raw_secret, &client.ip_address, client.user_agent.as_deref())
            .await?;

        Ok(LoginPayload {
            access_token: signed.token,
            expires_at_utc: signed.expires_at,
            refresh_token: rotation.secret,
            account_summary: AccountSummary::new(&account, &role_name),
        })
    }

    /// Revoke every refresh token the account holds.
    pub async fn logout(&self, account_id: DbId, client: &ClientContext) -> AppResult<u64> {
        self.refresh_tokens
            .revoke_all_for_account(account_id, &client.ip_address, Some(REASON_LOGOUT))
            .await
    }

    /// Administrative session kill, optionally disabling the account first
    /// so no new sessions can start.
    pub async fn revoke_account_sessions(
        &self,
        account_id: DbId,
        client: &ClientContext,
        reason: Option<&str>,
        deactivate: bool,
    ) -> AppResult<u64> {
        if self.accounts.find_account(account_id).await?.is_none() {
            return Err(CoreError::NotFound {
                entity: "account",
                id: account_id,
            }
            .into());
        }
        if deactivate {
            self.accounts.set_account_active(account_id, false).await?;
            tracing::info!(account_id, "Account deactivated");
        }
        self.refresh_tokens
            .revoke_all_for_account(account_id, &client.ip_address, reason)
            .await
    }

    async fn issue_payload(
        &self,
        account: &Account,
        role_name: &str,
        client: &ClientContext,
    ) -> AppResult<LoginPayload> {
        let signed = self
            .issuer
            .issue(&identity(account, role_name))
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
        let refresh_token = self
            .refresh_tokens
            .issue(account.id, &client.ip_address, client.user_agent.as_deref())
            .await?;

        Ok(LoginPayload {
            access_token: signed.token,
            expires_at_utc: signed.expires_at,
            refresh_token,
            account_summary: AccountSummary::new(account, role_name),
        })
    }

    async fn record_failure(&self, account_id: Option<DbId>, client: &ClientContext, reason: &str) {
        self.audit
            .record(
                account_id,
                &client.ip_address,
                client.user_agent.as_deref(),
                false,
                Some(reason),
            )
            .await;
    }
}

fn missing_role() -> AppError {
    CoreError::Internal("Account role not found".into()).into()
}

fn identity(account: &Account, role_name: &str) -> AccountIdentity {
    AccountIdentity {
        account_id: account.id,
        username: account.username.clone(),
        email: account.email.clone(),
        first_name: account.first_name.clone(),
        last_name: account.last_name.clone(),
        is_active: account.is_active,
        role_id: account.role_id,
        role_name: role_name.to_string(),
    }
}
