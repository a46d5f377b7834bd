//! Credential and session lifecycle.
//!
//! - [`password`] -- Argon2id hashing, legacy bcrypt verification.
//! - [`jwt`] -- access token issuance and validation.
//! - [`verifier`] -- username/password checks.
//! - [`refresh`] -- refresh token issuance, rotation, and revocation.
//! - [`audit`] -- the login audit trail.
//! - [`login`] -- the login and refresh flows tying the above together.

pub mod audit;
pub mod jwt;
pub mod login;
pub mod password;
pub mod refresh;
pub mod verifier;

/// Run CPU-heavy work (password hashing) off the async executor.
pub(crate) async fn run_blocking<F, T>(work: F) -> crate::error::AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| crate::error::AppError::InternalError(format!("Blocking task failed: {e}")))
}
