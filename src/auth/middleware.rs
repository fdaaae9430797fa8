//! Per-request authentication gate
//!
//! Establishes (or not) an authenticated principal from the bearer token. The gate
//! never rejects a request itself: anything that goes wrong leaves the request
//! anonymous, and handlers that need a principal reject with 401 via the extractor.

use crate::{
    auth::jwt::{TokenKind, TokenService},
    error::AppError,
    models::user::{Role, User},
    repository::UserStore,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use futures::FutureExt;
use std::{panic::AssertUnwindSafe, sync::Arc};
use uuid::Uuid;

const BEARER_PREFIX: &str = "Bearer ";

/// Principal attached to the request extensions by the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    /// `ROLE_<ROLE>`
    pub authority: String,
}

impl From<&User> for AuthenticatedPrincipal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            authority: user.role.authority(),
        }
    }
}

impl AuthenticatedPrincipal {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.has_role(role) {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.username,
                required = %role.authority(),
                actual = %self.authority,
                "Principal lacks required role"
            );
            Err(AppError::Forbidden)
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Token from `Authorization: Bearer <token>`, if present
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
}

/// Resolves a bearer access token to a live principal
pub struct AuthenticationGate {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
}

impl AuthenticationGate {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Option<AuthenticatedPrincipal> {
        let token = extract_bearer_token(headers)?;

        // Parsed once; kind and subject both come from the same claim set
        let claims = self.tokens.validate_and_parse(token).ok()?;

        if claims.token_type != TokenKind::Access {
            tracing::debug!(kind = %claims.token_type, "Non-access token presented to gate");
            return None;
        }

        if claims.sub.trim().is_empty() {
            return None;
        }

        match self.users.find_by_username(&claims.sub).await {
            Ok(Some(user)) => Some(AuthenticatedPrincipal::from(&user)),
            Ok(None) => {
                tracing::warn!(username = %claims.sub, "Token subject no longer exists");
                None
            }
            Err(e) => {
                tracing::error!(username = %claims.sub, error = %e, "Failed to load token subject");
                None
            }
        }
    }
}

/// 认证中间件 - 不强制要求令牌，失败时保持匿名
pub async fn authentication_gate(
    State(gate): State<Arc<AuthenticationGate>>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.extensions().get::<AuthenticatedPrincipal>().is_none() {
        let outcome = AssertUnwindSafe(gate.authenticate(req.headers()))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Some(principal)) => {
                tracing::debug!(
                    username = %principal.username,
                    authority = %principal.authority,
                    "Request authenticated"
                );
                req.extensions_mut().insert(principal);
            }
            Ok(None) => {}
            Err(_) => {
                tracing::error!("Authentication gate panicked; continuing anonymously");
            }
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token_valid() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer test_token_123".parse().unwrap());

        assert_eq!(extract_bearer_token(&headers), Some("test_token_123"));
    }

    #[test]
    fn test_extract_bearer_token_missing() {
        let headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());
    }

    #[test]
    fn test_extract_bearer_token_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "InvalidFormat".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_none());

        // Scheme is case-sensitive
        headers.insert(AUTHORIZATION, "bearer abc".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_none());
    }

    #[test]
    fn test_principal_roles() {
        let user = User::new("johndoe", "john@example.com", "hash", None, None);
        let principal = AuthenticatedPrincipal::from(&user);

        assert_eq!(principal.authority, "ROLE_USER");
        assert!(principal.has_role(Role::User));
        assert!(principal.require_role(Role::User).is_ok());

        let err = principal.require_role(Role::Admin).unwrap_err();
        assert_eq!(err.code(), 403);

        let admin = AuthenticatedPrincipal::from(&user.promote_to_admin());
        assert_eq!(admin.authority, "ROLE_ADMIN");
        assert!(admin.require_role(Role::Admin).is_ok());
    }
}
