//! Process configuration loaded from environment variables.
//!
//! Missing signing key, issuer, or audience is a startup failure: `main`
//! refuses to serve rather than issuing tokens that no consumer can verify.

use std::fmt::Display;
use std::ops::RangeInclusive;

use backoffice_core::login_audit::{DEFAULT_RETENTION_DAYS, MAX_LOOKBACK_DAYS};
use backoffice_core::refresh_token::DEFAULT_LIFETIME_DAYS;

/// Default access token lifetime in hours.
pub const DEFAULT_ACCESS_EXPIRY_HOURS: i64 = 2;

/// Accepted access token lifetimes, in hours.
pub const ACCESS_EXPIRY_HOURS_RANGE: RangeInclusive<i64> = 1..=24 * 365;

/// Accepted refresh token lifetimes, in days.
pub const REFRESH_EXPIRY_DAYS_RANGE: RangeInclusive<i64> = 1..=MAX_LOOKBACK_DAYS;

/// Accepted login audit retention windows, in days.
pub const AUDIT_RETENTION_DAYS_RANGE: RangeInclusive<i64> = 1..=MAX_LOOKBACK_DAYS;

/// Default retention cleanup interval in seconds (hourly).
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Accepted cleanup intervals, in seconds (up to one week).
pub const CLEANUP_INTERVAL_SECS_RANGE: RangeInclusive<u64> = 1..=7 * 24 * 3600;

/// Configuration that cannot be used to start the server.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Take the client IP from `X-Forwarded-For` (default: `false`). Only
    /// enable behind a reverse proxy that overwrites the header.
    pub trust_forwarded_for: bool,
    pub auth: AuthConfig,
    pub retention: RetentionConfig,
}

/// Token signing and lifetime settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 key used to sign and verify access tokens.
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry_hours: i64,
    pub refresh_token_expiry_days: i64,
    /// HMAC key for refresh token lookup digests. Defaults to `jwt_secret`.
    pub refresh_digest_key: String,
}

/// Settings for the periodic purge of refresh tokens and login audits.
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    pub audit_retention_days: i64,
    pub cleanup_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `TRUST_FORWARDED_FOR`  | `false`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or("PORT", &lookup, 3000u16)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_or("REQUEST_TIMEOUT_SECS", &lookup, 30u64)?;
        let trust_forwarded_for = parse_or("TRUST_FORWARDED_FOR", &lookup, false)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            trust_forwarded_for,
            auth: AuthConfig::from_lookup(&lookup)?,
            retention: RetentionConfig::from_lookup(&lookup)?,
        })
    }
}

impl AuthConfig {
    /// | Env Var                     | Required | Default      |
    /// |-----------------------------|----------|--------------|
    /// | `JWT_SECRET`                | **yes**  | --           |
    /// | `JWT_ISSUER`                | **yes**  | --           |
    /// | `JWT_AUDIENCE`              | **yes**  | --           |
    /// | `JWT_EXPIRE_HOURS`          | no       | `2`          |
    /// | `REFRESH_TOKEN_EXPIRY_DAYS` | no       | `7`          |
    /// | `REFRESH_TOKEN_DIGEST_KEY`  | no       | `JWT_SECRET` |
    ///
    /// An unparsable or out-of-range `JWT_EXPIRE_HOURS` falls back to the
    /// default instead of failing. `REFRESH_TOKEN_EXPIRY_DAYS` outside
    /// [`REFRESH_EXPIRY_DAYS_RANGE`] is rejected.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = required("JWT_SECRET", lookup)?;
        let issuer = required("JWT_ISSUER", lookup)?;
        let audience = required("JWT_AUDIENCE", lookup)?;

        let access_token_expiry_hours = lookup("JWT_EXPIRE_HOURS")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|hours| ACCESS_EXPIRY_HOURS_RANGE.contains(hours))
            .unwrap_or(DEFAULT_ACCESS_EXPIRY_HOURS);

        let refresh_token_expiry_days = parse_in_range(
            "REFRESH_TOKEN_EXPIRY_DAYS",
            lookup,
            DEFAULT_LIFETIME_DAYS,
            REFRESH_EXPIRY_DAYS_RANGE,
        )?;

        let refresh_digest_key = lookup("REFRESH_TOKEN_DIGEST_KEY")
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| jwt_secret.clone());

        Ok(Self {
            jwt_secret,
            issuer,
            audience,
            access_token_expiry_hours,
            refresh_token_expiry_days,
            refresh_digest_key,
        })
    }
}

impl RetentionConfig {
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `LOGIN_AUDIT_RETENTION_DAYS` | `90`    |
    /// | `CLEANUP_INTERVAL_SECS`      | `3600`  |
    ///
    /// Zero, negative, or oversized values are rejected.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            audit_retention_days: parse_in_range(
                "LOGIN_AUDIT_RETENTION_DAYS",
                lookup,
                DEFAULT_RETENTION_DAYS,
                AUDIT_RETENTION_DAYS_RANGE,
            )?,
            cleanup_interval_secs: parse_in_range(
                "CLEANUP_INTERVAL_SECS",
                lookup,
                DEFAULT_CLEANUP_INTERVAL_SECS,
                CLEANUP_INTERVAL_SECS_RANGE,
            )?,
        })
    }
}

fn required<F>(name: &'static str, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<F, T>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
    }
}

fn parse_in_range<F, T>(
    name: &'static str,
    lookup: &F,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Display,
{
    let value = parse_or(name, lookup, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
    }
}
