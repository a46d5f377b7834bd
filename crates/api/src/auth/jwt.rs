//! Access token issuance and validation.
//!
//! Access tokens are HS256-signed JWTs carrying an [`AccessClaims`] payload.
//! Issuer and audience are always set and always checked, and expiry is
//! enforced with zero leeway.

use backoffice_core::claims::{AccessClaims, AccountIdentity};
use backoffice_core::types::Timestamp;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config::AuthConfig;

/// A signed access token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Why a presented access token was rejected.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Unsupported claims version {0}")]
    UnsupportedVersion(u16),
}

/// Signs and verifies access tokens with one symmetric key.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            lifetime: Duration::hours(config.access_token_expiry_hours),
        }
    }

    /// Access token lifetime.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Sign a token for `identity`, valid from now for the configured lifetime.
    pub fn issue(&self, identity: &AccountIdentity) -> Result<SignedToken, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    /// Sign a token as if issued at `issued_at`.
    pub fn issue_at(
        &self,
        identity: &AccountIdentity,
        issued_at: Timestamp,
    ) -> Result<SignedToken, TokenError> {
        let expires_at = issued_at + self.lifetime;
        let claims = AccessClaims::new(
            identity,
            &self.issuer,
            &self.audience,
            issued_at,
            expires_at,
        );
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(SignedToken { token, expires_at })
    }

    /// Verify signature, issuer, audience, expiry, and claims version.
    pub fn validate(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)?;
        if !data.claims.is_supported_version() {
            return Err(TokenError::UnsupportedVersion(data.claims.ver));
        }
        Ok(data.claims)
    }
}
