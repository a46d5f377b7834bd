//! Access-token authentication extractor for Axum handlers.
//!
//! The token is read from the `Authorization` header, with or without a
//! case-insensitive `Bearer ` prefix. Long-lived streaming connections
//! (WebSocket upgrades and `text/event-stream` requests) cannot always set
//! headers, so for those alone an `access_token` query parameter is also
//! accepted.

use axum::extract::{FromRequestParts, Query};
use axum::http::header::{ACCEPT, AUTHORIZATION, UPGRADE};
use axum::http::HeaderName;
use axum::http::request::Parts;
use backoffice_core::claims::AccessClaims;
use backoffice_core::error::CoreError;
use backoffice_core::types::DbId;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

const BEARER_SCHEME: &str = "bearer";

/// Authenticated account extracted from a valid access token.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(account_id = user.account_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account_id: DbId,
    pub username: String,
    /// Role name (e.g. `"Admin"`).
    pub role: String,
    pub role_id: DbId,
    pub claims: AccessClaims,
}

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing access token".into()))
        })?;

        let claims = state.token_issuer.validate(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            account_id: claims.account_id,
            username: claims.name.clone(),
            role: claims.role.clone(),
            role_id: claims.role_id,
            claims,
        })
    }
}

/// Find the raw access token on a request, if any.
pub fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(header) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        let token = strip_bearer(header.trim());
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    if !is_streaming_request(parts) {
        return None;
    }
    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.access_token)
        .filter(|t| !t.is_empty())
}

/// Drop a leading `Bearer` scheme word. The word only counts as the scheme
/// when it ends the value or is followed by whitespace.
fn strip_bearer(value: &str) -> &str {
    let Some((scheme, rest)) = value
        .get(..BEARER_SCHEME.len())
        .zip(value.get(BEARER_SCHEME.len()..))
    else {
        return value;
    };
    if scheme.eq_ignore_ascii_case(BEARER_SCHEME)
        && (rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        rest.trim()
    } else {
        value
    }
}

fn is_streaming_request(parts: &Parts) -> bool {
    let header = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    };
    header(UPGRADE).eq_ignore_ascii_case("websocket")
        || header(ACCEPT).to_ascii_lowercase().contains("text/event-stream")
}
