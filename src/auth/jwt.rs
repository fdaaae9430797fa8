//! JWT token generation and validation
//! Implements access token + refresh token pattern, signed with HS512
//!
//! Tokens are not persisted and there is no revocation list: once issued, a token
//! stays valid until `exp` even if the account is later changed or removed.
//! Logout is therefore client-side only.

use crate::{
    config::{AppConfig, SecurityConfig, MIN_JWT_SECRET_BYTES},
    error::AppError,
    models::user::{Role, User},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Issuer claim identifying this service
pub const TOKEN_ISSUER: &str = "wardrobe-api";

/// Audience claim identifying the consuming client
pub const TOKEN_AUDIENCE: &str = "wardrobe-ui";

/// Token kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// JWT ID (unique token identifier)
    pub jti: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    #[serde(rename = "userId")]
    pub user_id: String,

    pub email: String,

    pub role: Role,

    /// Token type (access or refresh)
    #[serde(rename = "tokenType")]
    pub token_type: TokenKind,
}

/// Why a token string was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("token is empty")]
    Blank,

    #[error("token is malformed")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token algorithm is not supported")]
    UnsupportedAlgorithm,

    #[error("token issuer is not accepted")]
    WrongIssuer,

    #[error("token audience is not accepted")]
    WrongAudience,
}

impl From<jsonwebtoken::errors::Error> for TokenRejection {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenRejection::Expired,
            ErrorKind::InvalidSignature => TokenRejection::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenRejection::UnsupportedAlgorithm
            }
            ErrorKind::InvalidIssuer => TokenRejection::WrongIssuer,
            ErrorKind::InvalidAudience => TokenRejection::WrongAudience,
            _ => TokenRejection::Malformed,
        }
    }
}

/// Mints and verifies signed claim sets. Holds no mutable state.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl TokenService {
    /// Create token service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(&config.security)
    }

    pub fn new(security: &SecurityConfig) -> Result<Self, AppError> {
        let secret = security.jwt_secret.expose_secret();

        if secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(AppError::Config(format!(
                "JWT secret too short for HS512 (min {} bytes)",
                MIN_JWT_SECRET_BYTES
            )));
        }

        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_token_ttl: Duration::minutes(security.access_token_exp_minutes as i64),
            refresh_token_ttl: Duration::days(security.refresh_token_exp_days as i64),
        })
    }

    /// Seconds until a freshly issued access token expires
    pub fn access_token_expires_in(&self) -> u64 {
        self.access_token_ttl.num_seconds().max(0) as u64
    }

    pub fn issue_access_token(&self, user: &User) -> Result<String, AppError> {
        self.issue(user, TokenKind::Access, self.access_token_ttl)
    }

    pub fn issue_refresh_token(&self, user: &User) -> Result<String, AppError> {
        self.issue(user, TokenKind::Refresh, self.refresh_token_ttl)
    }

    fn issue(&self, user: &User, kind: TokenKind, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();

        let claims = Claims {
            sub: user.username.clone(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            user_id: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            token_type: kind,
        };

        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS512), claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode {} token: {:?}", claims.token_type, e);
            AppError::Internal(format!("Failed to encode {} token: {}", claims.token_type, e))
        })
    }

    /// Verify structure, algorithm, signature, expiry, issuer and audience
    pub fn validate_and_parse(&self, token: &str) -> Result<Claims, TokenRejection> {
        let token = token.trim();

        if token.is_empty() {
            tracing::debug!("Token validation failed: empty token");
            return Err(TokenRejection::Blank);
        }

        if token.split('.').count() != 3 {
            tracing::debug!("Token validation failed: expected three segments");
            return Err(TokenRejection::Malformed);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let rejection = TokenRejection::from(e);
                tracing::debug!(reason = %rejection, "Token validation failed");
                rejection
            })
    }

    pub fn extract_username(&self, token: &str) -> Option<String> {
        self.validate_and_parse(token).ok().map(|claims| claims.sub)
    }

    pub fn is_access_token(&self, token: &str) -> bool {
        self.is_kind(token, TokenKind::Access)
    }

    pub fn is_refresh_token(&self, token: &str) -> bool {
        self.is_kind(token, TokenKind::Refresh)
    }

    fn is_kind(&self, token: &str, kind: TokenKind) -> bool {
        self.validate_and_parse(token)
            .map(|claims| claims.token_type == kind)
            .unwrap_or(false)
    }
}
