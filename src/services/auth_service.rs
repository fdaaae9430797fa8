//! 认证服务：注册、登录、令牌刷新、登出

use crate::{
    auth::{
        jwt::{TokenKind, TokenService},
        middleware::AuthenticatedPrincipal,
        password::PasswordHasher,
    },
    config::AppConfig,
    error::AppError,
    models::{auth::*, user::*},
    repository::UserStore,
};
use std::sync::Arc;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<TokenService>,
        config: Arc<AppConfig>,
    ) -> Result<Self, AppError> {
        let hasher = PasswordHasher::from_config(&config.security)?;

        Ok(Self {
            users,
            tokens,
            hasher,
            config,
        })
    }

    /// 用户注册
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthenticationResponse, AppError> {
        req.validate()?;
        PasswordHasher::validate_password_policy(&req.password, &self.config.security)?;

        // 先检查用户名，再检查邮箱
        if self.users.exists_by_username(&req.username).await? {
            return Err(AppError::Conflict(format!(
                "User with username {} already exists",
                req.username
            )));
        }

        if self.users.exists_by_email(&req.email).await? {
            return Err(AppError::Conflict(format!(
                "User with email {} already exists",
                req.email
            )));
        }

        let password_hash = self.hasher.hash(&req.password)?;

        let user = User::new(
            req.username,
            req.email,
            password_hash,
            Some(req.first_name),
            Some(req.last_name),
        );

        let user = self.users.save(user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        self.issue_token_pair(&user)
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest) -> Result<AuthenticationResponse, AppError> {
        req.validate()?;

        // 用户不存在与密码错误返回同样的错误
        let user = match self.users.find_by_username(&req.username).await? {
            Some(user) if self.hasher.matches(&req.password, &user.password_hash) => user,
            _ => {
                tracing::warn!(username = %req.username, "Login failed");
                metrics::counter!("auth.login.failure").increment(1);
                return Err(AppError::InvalidCredentials(INVALID_CREDENTIALS.to_string()));
            }
        };

        // 只写登录时间，避免覆盖并发的角色变更
        let user = self.users.record_login(user.id).await?.ok_or_else(|| {
            tracing::warn!(username = %req.username, "User removed during login");
            AppError::InvalidCredentials(INVALID_CREDENTIALS.to_string())
        })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");
        metrics::counter!("auth.login.success").increment(1);

        self.issue_token_pair(&user)
    }

    /// 刷新令牌（仅接受 refresh 类型）
    pub async fn refresh(
        &self,
        req: RefreshTokenRequest,
    ) -> Result<AuthenticationResponse, AppError> {
        req.validate()?;

        let invalid = || AppError::InvalidCredentials(INVALID_REFRESH_TOKEN.to_string());

        let claims = self
            .tokens
            .validate_and_parse(&req.refresh_token)
            .map_err(|e| {
                tracing::debug!(reason = %e, "Refresh token rejected");
                invalid()
            })?;

        if claims.token_type != TokenKind::Refresh {
            tracing::debug!(kind = %claims.token_type, "Non-refresh token presented for refresh");
            return Err(invalid());
        }

        let user = self
            .users
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::warn!(username = %claims.sub, "Refresh token subject no longer exists");
                invalid()
            })?;

        self.issue_token_pair(&user)
    }

    /// 当前用户信息
    pub async fn current_user(&self, username: &str) -> Result<UserResponse, AppError> {
        self.users
            .find_by_username(username)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }

    /// 登出：令牌无状态，仅记录日志，由客户端丢弃令牌
    pub fn logout(&self, principal: &AuthenticatedPrincipal) {
        tracing::info!(
            user_id = %principal.user_id,
            username = %principal.username,
            "User logged out"
        );
    }

    /// 提升为管理员
    pub async fn promote_to_admin(&self, username: &str) -> Result<UserResponse, AppError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

        let user = self.users.save(user.promote_to_admin()).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User promoted to admin");

        Ok(UserResponse::from(user))
    }

    pub fn issue_token_pair(&self, user: &User) -> Result<AuthenticationResponse, AppError> {
        Ok(AuthenticationResponse::bearer(
            self.tokens.issue_access_token(user)?,
            self.tokens.issue_refresh_token(user)?,
            self.tokens.access_token_expires_in(),
        ))
    }
}
