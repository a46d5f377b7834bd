//! Username and password verification.
//!
//! Unknown usernames, wrong passwords, and disabled accounts all cost one
//! full password verification, and the first two are indistinguishable to
//! the caller. The disabled check runs only after the password is checked.

use std::sync::Arc;

use backoffice_core::error::CoreError;
use backoffice_core::login_audit::failure_reasons;
use backoffice_core::types::DbId;
use backoffice_db::models::account::Account;
use backoffice_db::store::AccountRepository;

use crate::auth::password::{verify_against_dummy, verify_password};
use crate::auth::run_blocking;
use crate::error::AppResult;

/// Outcome of a credential check, with enough detail for the audit trail.
#[derive(Debug)]
pub enum Verification {
    Verified(Account),
    UnknownUsername,
    WrongPassword { account_id: DbId },
    Inactive { account_id: DbId },
}

impl Verification {
    /// The account the attempt was made against, if it exists.
    pub fn account_id(&self) -> Option<DbId> {
        match self {
            Verification::Verified(account) => Some(account.id),
            Verification::UnknownUsername => None,
            Verification::WrongPassword { account_id } | Verification::Inactive { account_id } => {
                Some(*account_id)
            }
        }
    }

    /// Audit failure reason, `None` on success.
    pub fn failure_reason(&self) -> Option<&'static str> {
        match self {
            Verification::Verified(_) => None,
            Verification::UnknownUsername => Some(failure_reasons::UNKNOWN_USER),
            Verification::WrongPassword { .. } => Some(failure_reasons::INVALID_PASSWORD),
            Verification::Inactive { .. } => Some(failure_reasons::INACTIVE_ACCOUNT),
        }
    }

    pub fn into_result(self) -> Result<Account, CoreError> {
        match self {
            Verification::Verified(account) => Ok(account),
            Verification::UnknownUsername | Verification::WrongPassword { .. } => {
                Err(CoreError::InvalidCredentials)
            }
            Verification::Inactive { .. } => Err(CoreError::AccountInactive),
        }
    }
}

/// Checks a username/password pair against the stored account.
pub struct CredentialVerifier {
    accounts: Arc<dyn AccountRepository>,
}

impl CredentialVerifier {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    /// Verify credentials, returning the account on success.
    ///
    /// Fails with `InvalidCredentials` for an unknown username or a wrong
    /// password and with `AccountInactive` for a disabled account, whether
    /// or not the password matched.
    pub async fn verify(&self, username: &str, password: &str) -> AppResult<Account> {
        Ok(self.check(username, password).await?.into_result()?)
    }

    /// Verify credentials and report exactly which check failed.
    ///
    /// The distinction is for internal logging and auditing only.
    pub async fn check(&self, username: &str, password: &str) -> AppResult<Verification> {
        let account = self.accounts.find_account_by_username(username).await?;
        let password = password.to_owned();

        let Some(account) = account else {
            run_blocking(move || verify_against_dummy(&password)).await?;
            tracing::warn!(username, "Login rejected: unknown username");
            return Ok(Verification::UnknownUsername);
        };

        let account_id = account.id;
        let stored_hash = account.password_hash.clone();
        let matches = run_blocking(move || verify_password(&password, &stored_hash)).await?;
        let matches = match matches {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(account_id, error = %e, "Stored password hash is unreadable");
                false
            }
        };

        if !account.is_active {
            tracing::warn!(account_id, "Login rejected: account inactive");
            return Ok(Verification::Inactive { account_id });
        }
        if !matches {
            tracing::warn!(account_id, "Login rejected: wrong password");
            return Ok(Verification::WrongPassword { account_id });
        }

        Ok(Verification::Verified(account))
    }
}
