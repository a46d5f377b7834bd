//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod account_repo;
pub mod login_audit_repo;
pub mod refresh_token_repo;
pub mod role_repo;

pub use account_repo::AccountRepo;
pub use login_audit_repo::LoginAuditRepo;
pub use refresh_token_repo::RefreshTokenRepo;
pub use role_repo::RoleRepo;
