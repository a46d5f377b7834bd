use std::sync::Arc;

use backoffice_db::store::{
    AccountRepository, LoginAuditRepository, RefreshTokenRepository, RoleRepository, StoreHealth,
};

use crate::auth::audit::LoginAuditLog;
use crate::auth::jwt::TokenIssuer;
use crate::auth::login::LoginService;
use crate::auth::refresh::RefreshTokenStore;
use crate::background::retention::RetentionCleanup;
use crate::config::ServerConfig;
use crate::roles::RoleHierarchy;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (every field is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Backing store liveness, reported by `/health`.
    pub store_health: Arc<dyn StoreHealth>,
    pub token_issuer: Arc<TokenIssuer>,
    pub refresh_tokens: Arc<RefreshTokenStore>,
    pub login_audit: Arc<LoginAuditLog>,
    pub login: Arc<LoginService>,
    pub roles: Arc<RoleHierarchy>,
    pub retention: Arc<RetentionCleanup>,
}

impl AppState {
    /// Wire every service to one store implementing the full persistence
    /// contract (PostgreSQL in production, in-memory in tests).
    pub fn new<S>(config: ServerConfig, store: Arc<S>) -> Self
    where
        S: AccountRepository
            + RoleRepository
            + RefreshTokenRepository
            + LoginAuditRepository
            + StoreHealth
            + 'static,
    {
        let token_issuer = Arc::new(TokenIssuer::new(&config.auth));
        let refresh_tokens = Arc::new(RefreshTokenStore::new(
            store.clone(),
            &config.auth.refresh_digest_key,
            config.auth.refresh_token_expiry_days,
        ));
        let login_audit = Arc::new(LoginAuditLog::new(store.clone()));
        let roles = Arc::new(RoleHierarchy::new(store.clone()));
        let login = Arc::new(LoginService::new(
            store.clone(),
            Arc::clone(&roles),
            Arc::clone(&token_issuer),
            Arc::clone(&refresh_tokens),
            Arc::clone(&login_audit),
        ));
        let retention = Arc::new(RetentionCleanup::new(
            Arc::clone(&refresh_tokens),
            Arc::clone(&login_audit),
            config.retention.audit_retention_days,
        ));

        Self {
            config: Arc::new(config),
            store_health: store,
            token_issuer,
            refresh_tokens,
            login_audit,
            login,
            roles,
            retention,
        }
    }
}
